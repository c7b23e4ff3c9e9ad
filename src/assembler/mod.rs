//! The Assembler module is in charge of taking assembly source
//! and producing the machine words for it.
//!
//! It does this in two passes over the same lines: the first collects
//! label addresses, the second decodes and encodes every instruction.

pub mod ast;
pub mod error;
pub mod labels;
pub mod lexer;
pub mod operand;
pub mod parser;

pub use self::error::{AsmError, Diagnostic};
pub use self::parser::{Assembly, Config, Parser};

/// Assembles a whole source text with the given configuration.
pub fn assemble_str(source: &str, config: Config) -> Assembly {
    let lines: Vec<lexer::SourceLine> = source
        .lines()
        .enumerate()
        .map(|(index, text)| lexer::SourceLine::new(index, text))
        .collect();
    Parser::new(config).run(&lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_program() {
        let program = "
            // Sum 1..3 into $r2 and write it out.
            START:
                ADI  $r1, $r0, 3      ; counter
                ADI  $r2, $r0, 0
            loop:
                ADD  $r2, $r2, $r1
                ADI  $r1, $r1, -1
                BNE  $r1, $r0, loop
                WWD  $r2
                SWD  $r2, 0x10($r0)
                JMP  done
                HLT
            done:
                HLT
            ";
        let out = assemble_str(program, Config::default());

        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert_eq!(out.labels.get("START"), Some(0));
        assert_eq!(out.labels.get("loop"), Some(2));
        assert_eq!(out.labels.get("done"), Some(9));
        assert_eq!(out.to_hex(), "\
4103
4200
F980
45FF
04FD
F81C
8210
9009
F01D
F01D
");
    }

    #[test]
    fn test_spaced_labels_resolve() {
        let program = "
            loop :
                ADI $r1, $r1, -1
                BNE $r1, $r0, loop
            end :
                JMP end
            ";
        let out = assemble_str(program, Config::default());

        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert_eq!(out.labels.get("loop"), Some(0));
        assert_eq!(out.labels.get("end"), Some(2));
        assert_eq!(out.to_hex(), "45FF\n04FE\n9002\n");
    }
}
