//! Phrase dictionaries and their composition.
//!
//! `PhraseDictionary` stores key → ranked values in one of two trie
//! backends (double-array or minimal-perfect-hash). `DictGroup` queries an
//! ordered list of dictionaries as one. Both implement `Dictionary`, the
//! longest-match capability the segmenter and conversion stages consume.

mod entry;
mod group;
mod hashed;
mod phrase;
mod phrase_io;
mod text;

pub use entry::{DictEntry, Lexicon};
pub use group::DictGroup;
pub use hashed::HashedTrie;
pub use phrase::PhraseDictionary;

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum DictError {
    #[error("dictionary file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {reason}")]
    InvalidText { line: usize, reason: String },

    #[error("empty key")]
    EmptyKey,

    #[error("key {0:?} has no values or an empty value")]
    EmptyValue(String),

    #[error("duplicate key {0:?}")]
    DuplicateKey(String),

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected TWDC)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("unknown backend tag: {0}")]
    UnknownBackend(u8),

    #[error("backend mismatch: file holds {found}, expected {expected}")]
    BackendMismatch { expected: Backend, found: Backend },

    #[error("payload checksum mismatch")]
    ChecksumMismatch,

    #[error("corrupt dictionary: {0}")]
    Corrupt(String),

    #[error("dictionary text is not valid UTF-8")]
    InvalidUtf8,

    #[error("serialization error: {0}")]
    Serialize(bincode::Error),

    #[error("deserialization error: {0}")]
    Deserialize(bincode::Error),

    #[error("trie construction failed: {0}")]
    Build(String),
}

impl DictError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound(_) => ErrorKind::FileNotFound,
            Self::InvalidText { .. } | Self::EmptyKey | Self::EmptyValue(_) | Self::DuplicateKey(_) => {
                ErrorKind::InvalidTextDictionary
            }
            Self::InvalidHeader
            | Self::InvalidMagic
            | Self::UnsupportedVersion(_)
            | Self::UnknownBackend(_)
            | Self::BackendMismatch { .. }
            | Self::ChecksumMismatch
            | Self::Corrupt(_)
            | Self::Deserialize(_) => ErrorKind::InvalidFormat,
            Self::InvalidUtf8 => ErrorKind::InvalidUtf8,
            Self::Io(_) | Self::Serialize(_) | Self::Build(_) => ErrorKind::Unknown,
        }
    }

    pub(crate) fn from_decode(e: bincode::Error) -> Self {
        if matches!(*e, bincode::ErrorKind::InvalidUtf8Encoding(_)) {
            Self::InvalidUtf8
        } else {
            Self::Deserialize(e)
        }
    }
}

impl From<lexime_trie::TrieError> for DictError {
    fn from(e: lexime_trie::TrieError) -> Self {
        match e {
            lexime_trie::TrieError::InvalidMagic => DictError::Corrupt("trie image has bad magic".into()),
            lexime_trie::TrieError::InvalidVersion => {
                DictError::Corrupt("trie image has unsupported version".into())
            }
            lexime_trie::TrieError::TruncatedData => DictError::Corrupt("trie image is truncated".into()),
        }
    }
}

/// Storage layout of a compiled `PhraseDictionary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// Double-array trie over UTF-8 bytes: fastest lookup, larger file.
    DoubleArray,
    /// Code-point trie with minimal-perfect-hash edges: compact, slower build.
    #[default]
    Hashed,
}

impl Backend {
    pub(crate) fn tag(self) -> u8 {
        match self {
            Self::DoubleArray => 1,
            Self::Hashed => 2,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Result<Self, DictError> {
        match tag {
            1 => Ok(Self::DoubleArray),
            2 => Ok(Self::Hashed),
            other => Err(DictError::UnknownBackend(other)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::DoubleArray => "array",
            Self::Hashed => "hashed",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "array" | "darts" | "double-array" => Ok(Self::DoubleArray),
            "hashed" | "marisa" | "hash" => Ok(Self::Hashed),
            other => Err(format!("unknown backend '{other}' (expected array or hashed)")),
        }
    }
}

/// A dictionary key found at the start of the queried text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    /// Matched length in bytes of the queried text.
    pub len: usize,
    /// Matched length in code points.
    pub char_len: usize,
    /// Ranked replacement phrases, never empty.
    pub values: &'a [String],
}

impl<'a> Match<'a> {
    pub fn default_value(&self) -> &'a str {
        self.values.first().map_or("", String::as_str)
    }
}

/// Longest-match lookup, the capability shared by single dictionaries and
/// groups. Implementations are immutable once built.
pub trait Dictionary: Send + Sync {
    /// The longest key that is a prefix of `text`.
    ///
    /// Matching at a code-point position `p` of some string `s` is
    /// `longest_match(&s[byte_offset_of(p)..])`.
    fn longest_match(&self, text: &str) -> Option<Match<'_>>;

    /// Length in code points of the longest key; 0 when empty.
    fn max_key_length(&self) -> usize;

    /// Number of keys. For groups this counts keys in every member.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared handle; dictionaries are reference-counted and never mutated.
pub type DictRef = Arc<dyn Dictionary>;
