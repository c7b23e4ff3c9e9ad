//! The label table and the first pass that fills it.
use std::collections::HashMap;

use super::error::{AsmError, Diagnostic};
use super::lexer::{SourceLine, Statement};

/// Maps case-sensitive label names to instruction addresses.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct LabelTable {
    labels: HashMap<String, u16>,
}

impl LabelTable {
    pub fn new() -> Self {
        LabelTable { labels: HashMap::new() }
    }

    /// Records `name` at `address`, returning the address it replaced.
    pub fn insert<S: Into<String>>(&mut self, name: S, address: u16) -> Option<u16> {
        self.labels.insert(name.into(), address)
    }

    pub fn get(&self, name: &str) -> Option<u16> {
        self.labels.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels ordered by address, then by name.
    pub fn sorted(&self) -> Vec<(&str, u16)> {
        let mut out: Vec<(&str, u16)> = self.labels.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        out.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(b.0)));
        out
    }

    /// Runs the first pass over `lines`.
    ///
    /// Every line that tokenizes as an instruction takes one address,
    /// whether or not its mnemonic turns out to be valid. Labels take none.
    /// Returns the table, the number of addresses handed out and any
    /// diagnostics. This pass never fails.
    pub fn collect(lines: &[SourceLine]) -> (LabelTable, u16, Vec<Diagnostic>) {
        let mut table = LabelTable::new();
        let mut diagnostics = Vec::new();
        let mut address: u16 = 0;

        for line in lines {
            match line.tokenize() {
                Statement::Empty => {}
                Statement::Label(name) => {
                    trace!("label `{}` at 0x{:03X}", name, address);
                    if table.insert(name.as_str(), address).is_some() {
                        diagnostics.push(Diagnostic::emit(line.index, log::Level::Warn, AsmError::RedefinedLabel(name)));
                    }
                }
                Statement::Instruction { .. } => address = address.wrapping_add(1),
            }
        }

        debug!("pass 1: {} label(s), {} instruction slot(s)", table.len(), address);
        (table, address, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &str) -> Vec<SourceLine> {
        text.lines().enumerate().map(|(i, l)| SourceLine::new(i, l)).collect()
    }

    #[test]
    fn test_collect_addresses() {
        let lines = source("
            START:
                ADI $r1, $r0, 1   ; 0
            loop:
                ADD $r2, $r2, $r1 ; 1
                // comment only
                BNE $r2, $r3, loop ; 2
            end:
            ");
        let (labels, count, diagnostics) = LabelTable::collect(&lines);

        assert_eq!(count, 3);
        assert_eq!(labels.get("START"), Some(0));
        assert_eq!(labels.get("loop"), Some(1));
        assert_eq!(labels.get("end"), Some(3));
        assert_eq!(labels.get("LOOP"), None);
        assert_eq!(labels.sorted(), vec![("START", 0), ("loop", 1), ("end", 3)]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_invalid_mnemonics_take_a_slot() {
        let lines = source("FOO $r1\nbar:\nHLT");
        let (labels, count, _) = LabelTable::collect(&lines);
        assert_eq!(count, 2);
        assert_eq!(labels.get("bar"), Some(1));
    }

    #[test]
    fn test_spaced_label_takes_no_slot() {
        let lines = source("loop :\nHLT\nend:\nHLT");
        let (labels, count, diagnostics) = LabelTable::collect(&lines);
        assert_eq!(count, 2);
        assert_eq!(labels.get("loop"), Some(0));
        assert_eq!(labels.get("end"), Some(1));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_redefined_label_overwrites() {
        let lines = source("a:\nHLT\na:\nHLT");
        let (labels, count, diagnostics) = LabelTable::collect(&lines);
        assert_eq!(count, 2);
        assert_eq!(labels.get("a"), Some(1));
        assert_eq!(labels.len(), 1);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 3);
        assert_eq!(diagnostics[0].level, log::Level::Warn);
        assert!(matches!(&diagnostics[0].error, AsmError::RedefinedLabel(l) if l == "a"));
    }

    #[test]
    fn test_empty_source() {
        let (labels, count, diagnostics) = LabelTable::collect(&[]);
        assert!(labels.is_empty());
        assert_eq!(count, 0);
        assert!(diagnostics.is_empty());
    }
}
