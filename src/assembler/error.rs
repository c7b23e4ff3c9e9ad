//! Errors produced while assembling.
//!
//! Only `InputNotFound` is fatal. Everything else is scoped to the line
//! it was raised on and is reported as a `Diagnostic`.
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AsmError {
    #[error("unknown instruction `{0}`")]
    UnknownMnemonic(String),

    #[error("missing operands for {mnemonic}: expected {expected}, found {found}")]
    MissingOperand {
        mnemonic: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid operand format `{0}`")]
    MalformedOperand(String),

    #[error("label `{0}` not found")]
    UnresolvedLabel(String),

    #[error("redefined label `{0}`, the previous address has been overwritten")]
    RedefinedLabel(String),

    #[error("no instructions were assembled")]
    EmptyOutput,

    #[error("unable to read input file `{path}`")]
    ReadInput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("file `{path}` not found")]
    InputNotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A line-scoped message collected during assembly.
#[derive(Debug)]
pub struct Diagnostic {
    /// 1-based source line, or 0 when the message concerns the whole run.
    pub line: usize,
    pub level: log::Level,
    pub error: AsmError,
}

impl Diagnostic {
    /// Builds a diagnostic for the zero-based `index` and logs it.
    pub fn emit(index: usize, level: log::Level, error: AsmError) -> Self {
        let diag = Diagnostic { line: index + 1, level, error };
        log!(level, "{}", diag);
        diag
    }

    /// Builds a diagnostic that is not tied to any source line and logs it.
    pub fn global(level: log::Level, error: AsmError) -> Self {
        let diag = Diagnostic { line: 0, level, error };
        log!(level, "{}", diag);
        diag
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.error)
        } else {
            write!(f, "line {}: {}", self.line, self.error)
        }
    }
}
