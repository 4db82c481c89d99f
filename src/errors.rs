//! Error and diagnostic types.
//!
//! The core never aborts a whole file because one object is malformed
//! (see the propagation policy in the crate root docs): parsing reports
//! non-fatal [`Diagnostic`]s alongside whatever objects it could recover.
//! [`Error`] exists for the handful of cases a caller may want to treat as
//! hard failures instead (e.g. exercising the lexical primitives directly).

use thiserror::Error as ThisError;

/// The five lexical/structural error kinds the scanner and header
/// recognizer can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A `{` has no matching `}` under lexical rules.
    UnterminatedBlock,
    /// A property has no terminating `;`.
    UnterminatedStatement,
    /// A `'` is never closed.
    UnterminatedString,
    /// A `/*` is never closed.
    UnterminatedComment,
    /// Object kind keyword found but id/name/structure does not match.
    MalformedHeader,
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParseErrorKind::UnterminatedBlock => "unterminated block",
            ParseErrorKind::UnterminatedStatement => "unterminated statement",
            ParseErrorKind::UnterminatedString => "unterminated string",
            ParseErrorKind::UnterminatedComment => "unterminated comment",
            ParseErrorKind::MalformedHeader => "malformed header",
        };
        f.write_str(s)
    }
}

/// A non-fatal issue recorded against a file during parsing. The parser
/// keeps going past the offending object rather than aborting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: ParseErrorKind,
    /// Byte offset into the (BOM-stripped) source where the issue was found.
    pub byte_offset: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: ParseErrorKind, byte_offset: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            byte_offset,
            message: message.into(),
        }
    }
}

/// Hard failure type. The core's public entry points are infallible over
/// well-formed *or* malformed AL text (malformed objects degrade to
/// diagnostics, not errors); this type is only surfaced by APIs that
/// exercise the lexical primitives directly without the recovery wrapper.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    Scan(ParseErrorKind),
}

pub type Result<T> = std::result::Result<T, Error>;
