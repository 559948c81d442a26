//! Compiled dictionary container.
//!
//! ```text
//! 0..4    magic "TWDC"
//! 4       format version
//! 5       backend tag (1 = double-array, 2 = hashed)
//! 6..8    reserved
//! 8..12   payload length (u32 LE)
//! 12..16  CRC-32 of the payload (u32 LE)
//! 16..    bincode payload { trie, values }
//! ```
//!
//! For the double-array backend `trie` is the `lexime_trie` byte image; the
//! hashed trie is stored as its own serde structure.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use lexime_trie::DoubleArray;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::phrase::TrieStore;
use super::{Backend, DictError, HashedTrie, Lexicon, PhraseDictionary};

pub(crate) const MAGIC: &[u8; 4] = b"TWDC";
pub(crate) const VERSION: u8 = 1;
pub(crate) const HEADER_SIZE: usize = 16;

#[derive(Serialize)]
struct PayloadRef<'a, T> {
    trie: &'a T,
    values: &'a [Vec<String>],
}

#[derive(Deserialize)]
struct Payload<T> {
    trie: T,
    values: Vec<Vec<String>>,
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// Backend recorded in a compiled dictionary header.
pub fn detect_backend(data: &[u8]) -> Result<Backend, DictError> {
    if data.len() < HEADER_SIZE {
        return Err(DictError::InvalidHeader);
    }
    if &data[..4] != MAGIC {
        return Err(DictError::InvalidMagic);
    }
    if data[4] != VERSION {
        return Err(DictError::UnsupportedVersion(data[4]));
    }
    Backend::from_tag(data[5])
}

impl PhraseDictionary {
    pub fn to_bytes(&self) -> Result<Vec<u8>, DictError> {
        let payload = match &self.trie {
            TrieStore::DoubleArray(da) => {
                let image = da.as_bytes();
                bincode::serialize(&PayloadRef {
                    trie: &image,
                    values: &self.values,
                })
            }
            TrieStore::Hashed(h) => bincode::serialize(&PayloadRef {
                trie: h,
                values: &self.values,
            }),
        }
        .map_err(DictError::Serialize)?;
        let payload_len: u32 = payload
            .len()
            .try_into()
            .map_err(|_| DictError::Build("payload exceeds u32::MAX".to_string()))?;

        let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.push(self.backend().tag());
        buf.extend_from_slice(&[0u8; 2]); // reserved
        buf.extend_from_slice(&payload_len.to_le_bytes());
        buf.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Decode a compiled dictionary, requiring it to hold `backend`.
    pub fn from_bytes(data: &[u8], backend: Backend) -> Result<Self, DictError> {
        Self::decode(data, Some(backend))
    }

    /// Decode a compiled dictionary of whichever backend its header names.
    pub fn from_bytes_any(data: &[u8]) -> Result<Self, DictError> {
        Self::decode(data, None)
    }

    fn decode(data: &[u8], expected: Option<Backend>) -> Result<Self, DictError> {
        let found = detect_backend(data)?;
        if let Some(expected) = expected {
            if expected != found {
                return Err(DictError::BackendMismatch { expected, found });
            }
        }
        let payload_len = read_u32(data, 8) as usize;
        let checksum = read_u32(data, 12);
        let payload = data
            .get(HEADER_SIZE..)
            .filter(|p| p.len() == payload_len)
            .ok_or(DictError::InvalidHeader)?;
        if crc32fast::hash(payload) != checksum {
            return Err(DictError::ChecksumMismatch);
        }

        let (trie, values, key_chars) = match found {
            Backend::DoubleArray => {
                let p: Payload<Vec<u8>> =
                    bincode::deserialize(payload).map_err(DictError::from_decode)?;
                let trie = DoubleArray::<u8>::from_bytes(&p.trie)?;
                let max = check_double_array(&trie, p.values.len())?;
                (TrieStore::DoubleArray(trie), p.values, max)
            }
            Backend::Hashed => {
                let p: Payload<HashedTrie> =
                    bincode::deserialize(payload).map_err(DictError::from_decode)?;
                let keys = p.trie.validate(p.values.len())?;
                let max = keys.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
                (TrieStore::Hashed(p.trie), p.values, max)
            }
        };
        if let Some(i) = values.iter().position(|v| v.is_empty() || v.iter().any(String::is_empty)) {
            return Err(DictError::Corrupt(format!("entry {i} has an empty value")));
        }
        Ok(Self {
            trie,
            values,
            max_key_chars: key_chars,
        })
    }

    /// Open a compiled dictionary via mmap, requiring it to hold `backend`.
    pub fn open(path: &Path, backend: Backend) -> Result<Self, DictError> {
        let dict = Self::from_bytes(&map_file(path)?, backend)?;
        debug!(path = %path.display(), %backend, entries = dict.values.len(), "opened dictionary");
        Ok(dict)
    }

    /// Open a compiled dictionary of either backend.
    pub fn open_detect(path: &Path) -> Result<Self, DictError> {
        let dict = Self::from_bytes_any(&map_file(path)?)?;
        debug!(path = %path.display(), backend = %dict.backend(), entries = dict.values.len(), "opened dictionary");
        Ok(dict)
    }

    /// Read a text dictionary file and build it into `backend`.
    pub fn open_text(path: &Path, backend: Backend) -> Result<Self, DictError> {
        let bytes = fs::read(path).map_err(|e| not_found(e, path))?;
        let dict = Self::from_lexicon(Lexicon::from_text_bytes(&bytes)?, backend)?;
        debug!(path = %path.display(), entries = dict.values.len(), "compiled text dictionary");
        Ok(dict)
    }

    /// Atomic write: write to .tmp then rename.
    pub fn save(&self, path: &Path) -> Result<(), DictError> {
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Every key of a decoded double-array must be non-empty UTF-8 and own
/// exactly one value slot. Returns the longest key length in code points.
fn check_double_array(da: &DoubleArray<u8>, value_count: usize) -> Result<usize, DictError> {
    let mut seen = vec![false; value_count];
    let mut max = 0;
    for m in da.predictive_search(b"") {
        if m.key.is_empty() {
            return Err(DictError::Corrupt("root node is marked as a key".into()));
        }
        let key = std::str::from_utf8(&m.key).map_err(|_| DictError::InvalidUtf8)?;
        let id = m.value_id as usize;
        match seen.get_mut(id) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(DictError::Corrupt(format!("unexpected value id {id}"))),
        }
        max = max.max(key.chars().count());
    }
    if let Some(missing) = seen.iter().position(|s| !s) {
        return Err(DictError::Corrupt(format!("value {missing} has no key")));
    }
    Ok(max)
}

fn not_found(e: io::Error, path: &Path) -> DictError {
    if e.kind() == io::ErrorKind::NotFound {
        DictError::FileNotFound(path.to_path_buf())
    } else {
        DictError::Io(e)
    }
}

fn map_file(path: &Path) -> Result<Mmap, DictError> {
    let file = File::open(path).map_err(|e| not_found(e, path))?;
    // SAFETY: The file is opened read-only, the mapping is immutable, and the
    // payload is decoded into owned data before the mapping is dropped.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(mmap)
}
