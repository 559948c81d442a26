//! Coarse error classification shared by every fallible operation.
//!
//! Detailed error enums (`DictError`, `ConverterError`, `ConvertError`)
//! keep their context for diagnostics; `kind()` collapses them into the
//! five categories callers at an embedding boundary dispatch on.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed line-oriented dictionary source.
    InvalidTextDictionary,
    /// Malformed, truncated or version-mismatched compiled dictionary.
    InvalidFormat,
    /// Dictionary text or conversion input is not well-formed UTF-8.
    InvalidUtf8,
    /// A referenced dictionary path does not exist.
    FileNotFound,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidTextDictionary => "invalid text dictionary",
            Self::InvalidFormat => "invalid format",
            Self::InvalidUtf8 => "invalid UTF-8",
            Self::FileNotFound => "file not found",
            Self::Unknown => "unknown error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
