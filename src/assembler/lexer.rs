//! This lexer splits assembly source into statements.
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, BufRead, BufReader, Read};

// Commas and parentheses bound tokens exactly like whitespace does,
// so `LWD $r1, 4($r2)` splits into `LWD $r1 4 $r2`.
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,()]+").expect("valid regex"));

// Any line ending in a colon declares a label; the name is everything before it.
static LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*?)\s*:$").expect("valid regex"));

const COMMENT_MARKERS: [&str; 2] = ["//", ";"];

/// One line of source text and its zero-based position in the file.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SourceLine {
    pub index: usize,
    pub text: String,
}

impl SourceLine {
    pub fn new<S: Into<String>>(index: usize, text: S) -> Self {
        SourceLine { index, text: text.into() }
    }

    pub fn tokenize(&self) -> Statement {
        tokenize_line(&self.text)
    }
}

/// What a single line contributes to the program.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Statement {
    /// Blank or comment-only.
    Empty,
    /// A `name:` declaration.
    Label(String),
    /// An uppercased mnemonic followed by its operand tokens, verbatim.
    Instruction { mnemonic: String, operands: Vec<String> },
}

/// Reads every line of the source, keeping its position for diagnostics.
pub fn read_lines<T: Read + ?Sized>(reader: Box<T>) -> io::Result<Vec<SourceLine>> {
    let mut lines = Vec::with_capacity(256);
    for (index, line) in BufReader::new(reader).lines().enumerate() {
        lines.push(SourceLine::new(index, line?));
    }
    debug!("read {} source line(s)", lines.len());
    Ok(lines)
}

/// Classifies a raw line. Only one statement is allowed per line.
pub fn tokenize_line(line: &str) -> Statement {
    let code = strip_comment(line).trim();
    if code.is_empty() {
        return Statement::Empty;
    }

    if let Some(caps) = LABEL.captures(code) {
        return Statement::Label(caps[1].to_owned());
    }

    let mut parts = SEPARATORS.split(code).filter(|part| !part.is_empty());
    match parts.next() {
        Some(mnemonic) => Statement::Instruction {
            mnemonic: mnemonic.to_uppercase(),
            operands: parts.map(str::to_owned).collect(),
        },
        // A line made only of separators, e.g. `,,`.
        None => Statement::Empty,
    }
}

/// Truncates the line at the first comment marker of either kind.
fn strip_comment(line: &str) -> &str {
    let end = COMMENT_MARKERS
        .iter()
        .filter_map(|marker| line.find(marker))
        .min()
        .unwrap_or_else(|| line.len());
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instruction(mnemonic: &str, operands: &[&str]) -> Statement {
        Statement::Instruction {
            mnemonic: mnemonic.to_owned(),
            operands: operands.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("ADD $r1, $r2, $r3 ; sum"), "ADD $r1, $r2, $r3 ");
        assert_eq!(strip_comment("ADD $r1, $r2, $r3 // sum"), "ADD $r1, $r2, $r3 ");
        assert_eq!(strip_comment("HLT // stop ; really"), "HLT ");
        assert_eq!(strip_comment("HLT ; stop // really"), "HLT ");
        assert_eq!(strip_comment("; only a comment"), "");
        assert_eq!(strip_comment("IRET"), "IRET");
    }

    #[test]
    fn test_empty_lines() {
        assert_eq!(tokenize_line(""), Statement::Empty);
        assert_eq!(tokenize_line("   \t  "), Statement::Empty);
        assert_eq!(tokenize_line("// comment"), Statement::Empty);
        assert_eq!(tokenize_line("   ; comment"), Statement::Empty);
        assert_eq!(tokenize_line(" , ,"), Statement::Empty);
    }

    #[test]
    fn test_labels() {
        assert_eq!(tokenize_line("START:"), Statement::Label("START".to_owned()));
        assert_eq!(tokenize_line("  loop:   ; back edge"), Statement::Label("loop".to_owned()));
        assert_eq!(tokenize_line("end: // done"), Statement::Label("end".to_owned()));

        assert_eq!(tokenize_line("loop :"), Statement::Label("loop".to_owned()));
        assert_eq!(tokenize_line("\tloop\t:  ; spaced"), Statement::Label("loop".to_owned()));
        assert_eq!(tokenize_line("JMP done:"), Statement::Label("JMP done".to_owned()));

        // A colon that does not end the line does not make a label.
        assert_eq!(tokenize_line("loop: ADD $r1, $r2, $r3"),
            instruction("LOOP:", &["ADD", "$r1", "$r2", "$r3"]));
    }

    #[test]
    fn test_instructions() {
        assert_eq!(tokenize_line("IRET"), instruction("IRET", &[]));
        assert_eq!(tokenize_line("add $r1, $r2, $r3"), instruction("ADD", &["$r1", "$r2", "$r3"]));
        assert_eq!(tokenize_line("Adi r1,r2,0x10"), instruction("ADI", &["r1", "r2", "0x10"]));
        assert_eq!(tokenize_line("\tWWD\t$0\t"), instruction("WWD", &["$0"]));
        assert_eq!(tokenize_line("BNE $r1, $r2, Loop ; retry"), instruction("BNE", &["$r1", "$r2", "Loop"]));
    }

    #[test]
    fn test_memory_operand_shapes() {
        assert_eq!(tokenize_line("LWD $r1, 4($r2)"), instruction("LWD", &["$r1", "4", "$r2"]));
        assert_eq!(tokenize_line("LWD $r1, $r2, 4"), instruction("LWD", &["$r1", "$r2", "4"]));
        assert_eq!(tokenize_line("swd r0,  -2 ( r3 )"), instruction("SWD", &["r0", "-2", "r3"]));
    }

    #[test]
    fn test_read_lines() {
        let asm_input = "START:\n  ADD $r1, $r2, $r3\n\n; done\nHLT\n";
        let lines = read_lines(Box::new(asm_input.as_bytes())).unwrap();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], SourceLine::new(0, "START:"));
        assert_eq!(lines[1].tokenize(), instruction("ADD", &["$r1", "$r2", "$r3"]));
        assert_eq!(lines[2].tokenize(), Statement::Empty);
        assert_eq!(lines[3].tokenize(), Statement::Empty);
        assert_eq!(lines[4], SourceLine::new(4, "HLT"));
    }
}
