// Structural error taxonomy and the per-Parser error surface.

use thiserror::Error;

/// Structural error codes the core can emit.
///
/// `FileNotFound`, `InvalidUTF8`, `InconsistentColumnCount`, and
/// `InvalidEscapeSequence` are reserved for collaborators layered on top of
/// this crate (schema validation, a file-reading wrapper) and are never
/// produced here.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("no error")]
    None,
    #[error("file not found")]
    FileNotFound,
    #[error("invalid UTF-8")]
    InvalidUTF8,
    #[error("unterminated quote")]
    UnterminatedQuote,
    #[error("invalid character after closing quote")]
    InvalidCharacterAfterQuote,
    #[error("row exceeds max_row_size")]
    MaxRowSizeExceeded,
    #[error("field exceeds max_row_size")]
    MaxFieldSizeExceeded,
    #[error("row has a different number of fields than expected")]
    InconsistentColumnCount,
    #[error("invalid escape sequence")]
    InvalidEscapeSequence,
    #[error("empty input")]
    EmptyInput,
    #[error("memory allocation failed")]
    MemoryAllocationFailed,
    #[error("invalid configuration")]
    InvalidConfig,
    #[error("field too large to pack (> 65535 bytes)")]
    FieldTooLargeToPack,
}

impl Default for ErrorKind {
    fn default() -> Self {
        ErrorKind::None
    }
}

/// A single recorded structural error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: ErrorKind,
    pub line: i64,
    pub column: i64,
    pub message: Vec<u8>,
    pub context: Vec<u8>,
}

impl ErrorInfo {
    pub fn none() -> Self {
        ErrorInfo::default()
    }

    pub fn new(code: ErrorKind, line: i64, column: i64, message: &[u8], context: &[u8]) -> Self {
        ErrorInfo {
            code,
            line,
            column,
            message: message.to_vec(),
            context: context.to_vec(),
        }
    }
}

/// How a parse should react to a structural violation.
///
/// `FailFast` is the default; the other three trade strictness for
/// resilience against malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPolicy {
    FailFast,
    SkipRow,
    BestEffort,
    CollectAllErrors { max_errors: u32 },
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        RecoveryPolicy::FailFast
    }
}
