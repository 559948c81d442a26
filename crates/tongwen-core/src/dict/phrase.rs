use lexime_trie::DoubleArray;
use tracing::debug;

use super::{Backend, DictEntry, DictError, Dictionary, HashedTrie, Lexicon, Match};

pub(crate) enum TrieStore {
    DoubleArray(DoubleArray<u8>),
    Hashed(HashedTrie),
}

/// An immutable phrase dictionary backed by one of the two trie layouts.
///
/// Both layouts give identical lookup results for the same entries; the
/// backend only trades footprint against build and lookup speed.
pub struct PhraseDictionary {
    pub(crate) trie: TrieStore,
    /// Ranked values, indexed by the trie's value id (key byte order).
    pub(crate) values: Vec<Vec<String>>,
    pub(crate) max_key_chars: usize,
}

impl PhraseDictionary {
    pub fn from_lexicon(lexicon: Lexicon, backend: Backend) -> Result<Self, DictError> {
        let max_key_chars = lexicon.max_key_length();
        let entries = lexicon.into_entries();
        let trie = {
            let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
            match backend {
                Backend::DoubleArray => {
                    let bytes: Vec<&[u8]> = keys.iter().map(|k| k.as_bytes()).collect();
                    TrieStore::DoubleArray(DoubleArray::<u8>::build(&bytes))
                }
                Backend::Hashed => TrieStore::Hashed(HashedTrie::build(&keys)?),
            }
        };
        let values: Vec<Vec<String>> = entries.into_iter().map(|e| e.values).collect();
        debug!(entries = values.len(), %backend, "built phrase dictionary");
        Ok(Self {
            trie,
            values,
            max_key_chars,
        })
    }

    pub fn from_entries(
        entries: impl IntoIterator<Item = DictEntry>,
        backend: Backend,
    ) -> Result<Self, DictError> {
        Self::from_lexicon(Lexicon::new(entries)?, backend)
    }

    /// Build from the line-oriented text format.
    pub fn from_text(content: &str, backend: Backend) -> Result<Self, DictError> {
        Self::from_lexicon(Lexicon::from_text(content)?, backend)
    }

    pub fn backend(&self) -> Backend {
        match self.trie {
            TrieStore::DoubleArray(_) => Backend::DoubleArray,
            TrieStore::Hashed(_) => Backend::Hashed,
        }
    }

    /// Values for exactly `key`.
    pub fn lookup(&self, key: &str) -> Option<&[String]> {
        let id = match &self.trie {
            TrieStore::DoubleArray(da) => da.exact_match(key.as_bytes()).map(|id| id as usize),
            TrieStore::Hashed(h) => h.exact_match(key).map(|id| id as usize),
        }?;
        self.values.get(id).map(Vec::as_slice)
    }

    /// Every key that is a prefix of `text`, shortest first.
    pub fn common_prefix_matches<'a>(&'a self, text: &str) -> Vec<Match<'a>> {
        let hits: Vec<(usize, usize)> = match &self.trie {
            TrieStore::DoubleArray(da) => da
                .common_prefix_search(text.as_bytes())
                .map(|m| (m.len, m.value_id as usize))
                .collect(),
            TrieStore::Hashed(h) => h
                .common_prefix_search(text)
                .into_iter()
                .map(|(len, id)| (len, id as usize))
                .collect(),
        };
        hits.into_iter()
            .filter_map(|(len, id)| self.make_match(text, len, id))
            .collect()
    }

    /// Keys starting with `prefix` in key order, at most `max_results`.
    ///
    /// The double-array backend walks the subtree under `prefix`; the hashed
    /// backend has no child lists and scans every key instead. Hits are
    /// sorted before truncation, so the result does not depend on the
    /// order the trie enumerates them in.
    pub fn predict(&self, prefix: &str, max_results: usize) -> Result<Vec<(String, &[String])>, DictError> {
        let mut hits: Vec<(String, usize)> = match &self.trie {
            TrieStore::DoubleArray(da) => da
                .predictive_search(prefix.as_bytes())
                .map(|m| {
                    let key = String::from_utf8(m.key).map_err(|_| DictError::InvalidUtf8)?;
                    Ok((key, m.value_id as usize))
                })
                .collect::<Result<_, DictError>>()?,
            TrieStore::Hashed(h) => h
                .keys()?
                .into_iter()
                .filter(|(k, _)| k.starts_with(prefix))
                .map(|(k, id)| (k, id as usize))
                .collect(),
        };
        hits.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        hits.truncate(max_results);
        hits.into_iter()
            .map(|(k, id)| {
                let values = self
                    .values
                    .get(id)
                    .ok_or_else(|| DictError::Corrupt(format!("value id {id} out of range")))?;
                Ok((k, values.as_slice()))
            })
            .collect()
    }

    /// Reconstruct the entry set, e.g. for re-encoding or text export.
    pub fn to_lexicon(&self) -> Result<Lexicon, DictError> {
        let keys: Vec<(String, u32)> = match &self.trie {
            TrieStore::DoubleArray(da) => da
                .predictive_search(b"")
                .map(|m| {
                    let key = String::from_utf8(m.key).map_err(|_| DictError::InvalidUtf8)?;
                    Ok((key, m.value_id as u32))
                })
                .collect::<Result<_, DictError>>()?,
            TrieStore::Hashed(h) => h.keys()?,
        };
        let entries = keys
            .into_iter()
            .map(|(key, id)| {
                let values = self
                    .values
                    .get(id as usize)
                    .cloned()
                    .ok_or_else(|| DictError::Corrupt(format!("value id {id} out of range")))?;
                Ok(DictEntry { key, values })
            })
            .collect::<Result<Vec<_>, DictError>>()?;
        Lexicon::new(entries)
    }

    /// Returns (key_count, value_count).
    pub fn stats(&self) -> (usize, usize) {
        let keys = self.values.len();
        let values = self.values.iter().map(Vec::len).sum();
        (keys, values)
    }

    fn make_match<'a>(&'a self, text: &str, len: usize, id: usize) -> Option<Match<'a>> {
        let values = self.values.get(id)?;
        Some(Match {
            len,
            char_len: text.get(..len)?.chars().count(),
            values,
        })
    }
}

impl Dictionary for PhraseDictionary {
    fn longest_match(&self, text: &str) -> Option<Match<'_>> {
        let (len, id) = match &self.trie {
            TrieStore::DoubleArray(da) => da
                .common_prefix_search(text.as_bytes())
                .last()
                .map(|m| (m.len, m.value_id as usize)),
            TrieStore::Hashed(h) => h.longest_prefix(text).map(|(len, id)| (len, id as usize)),
        }?;
        self.make_match(text, len, id)
    }

    fn max_key_length(&self) -> usize {
        self.max_key_chars
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(backend: Backend) -> PhraseDictionary {
        PhraseDictionary::from_entries(
            vec![
                DictEntry::new("干", ["幹", "乾", "干"]),
                DictEntry::new("干燥", ["乾燥"]),
                DictEntry::new("美国", ["美國"]),
                DictEntry::new("人", ["人"]),
            ],
            backend,
        )
        .unwrap()
    }

    #[test]
    fn test_longest_match_both_backends() {
        for backend in [Backend::DoubleArray, Backend::Hashed] {
            let dict = sample(backend);
            let m = dict.longest_match("干燥剂").unwrap();
            assert_eq!(m.char_len, 2, "{backend}");
            assert_eq!(m.len, "干燥".len());
            assert_eq!(m.default_value(), "乾燥");
            assert!(dict.longest_match("剂").is_none());
            assert_eq!(dict.max_key_length(), 2);
            assert_eq!(dict.len(), 4);
        }
    }

    #[test]
    fn test_lookup_returns_ranked_values() {
        let dict = sample(Backend::Hashed);
        assert_eq!(dict.lookup("干").unwrap(), ["幹", "乾", "干"]);
        assert!(dict.lookup("干燥剂").is_none());
    }

    #[test]
    fn test_common_prefix_matches() {
        let dict = sample(Backend::DoubleArray);
        let lens: Vec<usize> = dict
            .common_prefix_matches("干燥")
            .iter()
            .map(|m| m.char_len)
            .collect();
        assert_eq!(lens, vec![1, 2]);
    }

    #[test]
    fn test_predict_same_on_both_backends() {
        let a = sample(Backend::DoubleArray);
        let h = sample(Backend::Hashed);
        let keys = |d: &PhraseDictionary| -> Vec<String> {
            d.predict("干", 10).unwrap().into_iter().map(|(k, _)| k).collect()
        };
        assert_eq!(keys(&a), vec!["干", "干燥"]);
        assert_eq!(keys(&a), keys(&h));
        assert_eq!(a.predict("干", 1).unwrap().len(), 1);
        assert!(h.predict("干燥剂", 10).unwrap().is_empty());
    }

    #[test]
    fn test_to_lexicon_roundtrip() {
        for backend in [Backend::DoubleArray, Backend::Hashed] {
            let dict = sample(backend);
            let lex = dict.to_lexicon().unwrap();
            assert_eq!(lex.len(), 4);
            assert_eq!(lex.get("美国").unwrap().values, vec!["美國"]);
        }
    }

    #[test]
    fn test_stats() {
        let dict = sample(Backend::DoubleArray);
        assert_eq!(dict.stats(), (4, 6));
    }
}
