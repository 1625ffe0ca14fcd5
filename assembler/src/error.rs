//! Crate-wide error and diagnostic types (spec.md §7).
//!
//! The core never prints. Every pipeline stage returns an [`Outcome`] plus
//! zero or more [`Diagnostic`]s; rendering them is the CLI's job
//! (`src/main.rs`), matching the teacher's own `vasm` binary where
//! `vasm::Error` is returned by the library and only `Display`-ed by
//! `main.rs`.

use std::fmt;

/// One verbatim per-line parser/logic failure (spec.md §4.1, §4.3, §4.4).
///
/// Modeled as a single string-carrying type rather than one variant per
/// message: several of these messages are assembled with interpolated
/// context, so a closed enum would just duplicate the string table without
/// adding safety. `"memory allocation failed"` is the one message the
/// pipeline inspects programmatically (spec.md §4.1) to escalate a file
/// from "has per-line errors" to fatal.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ParseError(pub String);

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError(message.into())
    }

    pub fn is_fatal(&self) -> bool {
        self.0 == ALLOCATION_FAILURE
    }
}

pub const ALLOCATION_FAILURE: &str = "memory allocation failed";

/// Where in the per-file pipeline a diagnostic was produced.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub file: String,
    pub line: Option<u32>,
    pub detail: String,
}

impl Diagnostic {
    pub fn file_level(file: impl Into<String>, detail: impl Into<String>) -> Self {
        Diagnostic {
            file: file.into(),
            line: None,
            detail: detail.into(),
        }
    }

    pub fn line_level(file: impl Into<String>, line: u32, detail: impl Into<String>) -> Self {
        Diagnostic {
            file: file.into(),
            line: Some(line),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(n) => write!(
                f,
                "Error in: {}, in line number: {}, {}",
                self.file, n, self.detail
            ),
            None => write!(f, "Error in: {}, {}", self.file, self.detail),
        }
    }
}

/// The tri-state every pipeline stage settles into (spec.md §7).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The stage produced no diagnostics; later stages may run.
    Ok,
    /// At least one recoverable per-line error was reported; the current
    /// stage ran to completion but later stages must be skipped.
    HadErrors,
    /// An unrecoverable resource failure; all per-file state must unwind.
    Fatal,
}

impl Outcome {
    pub fn is_ok(self) -> bool {
        matches!(self, Outcome::Ok)
    }

    /// Combine the outcome of one line/stage into a running file outcome,
    /// never downgrading `Fatal` back to `HadErrors` or `Ok`.
    pub fn merge(self, other: Outcome) -> Outcome {
        use Outcome::*;
        match (self, other) {
            (Fatal, _) | (_, Fatal) => Fatal,
            (HadErrors, _) | (_, HadErrors) => HadErrors,
            (Ok, Ok) => Ok,
        }
    }
}

/// File-level failures: I/O and the escalated allocation failure.
#[derive(Debug, thiserror::Error)]
pub enum AssemblerError {
    #[error("reading input file failed: {0}")]
    ReadInput(#[source] std::io::Error),

    #[error("writing output file failed: {0}")]
    WriteOutput(#[source] std::io::Error),

    #[error("{0}")]
    Parse(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, AssemblerError>;
