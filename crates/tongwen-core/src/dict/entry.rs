use serde::{Deserialize, Serialize};

use super::DictError;

/// One key with its ranked replacement phrases; `values[0]` is the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictEntry {
    pub key: String,
    pub values: Vec<String>,
}

impl DictEntry {
    pub fn new(key: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn default_value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// A validated entry set: keys non-empty and unique, every key with at
/// least one non-empty value, sorted by key bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexicon {
    entries: Vec<DictEntry>,
}

impl Lexicon {
    pub fn new(entries: impl IntoIterator<Item = DictEntry>) -> Result<Self, DictError> {
        let mut entries: Vec<DictEntry> = entries.into_iter().collect();
        for e in &entries {
            check_entry(e)?;
        }
        entries.sort_by(|a, b| a.key.as_bytes().cmp(b.key.as_bytes()));
        if let Some(dup) = entries.windows(2).find(|w| w[0].key == w[1].key) {
            return Err(DictError::DuplicateKey(dup[0].key.clone()));
        }
        Ok(Self { entries })
    }

    /// Wrap entries already known to be valid and sorted.
    pub(crate) fn from_sorted_unchecked(entries: Vec<DictEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DictEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<DictEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&DictEntry> {
        self.entries
            .binary_search_by(|e| e.key.as_bytes().cmp(key.as_bytes()))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Longest key in code points.
    pub fn max_key_length(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.key.chars().count())
            .max()
            .unwrap_or(0)
    }
}

pub(crate) fn check_entry(e: &DictEntry) -> Result<(), DictError> {
    if e.key.is_empty() {
        return Err(DictError::EmptyKey);
    }
    if e.values.is_empty() || e.values.iter().any(|v| v.is_empty()) {
        return Err(DictError::EmptyValue(e.key.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_by_key_bytes() {
        let lex = Lexicon::new(vec![
            DictEntry::new("美", ["美"]),
            DictEntry::new("人", ["人"]),
            DictEntry::new("美国", ["美國"]),
        ])
        .unwrap();
        let keys: Vec<&str> = lex.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["人", "美", "美国"]);
        assert_eq!(lex.get("美国").and_then(|e| e.default_value()), Some("美國"));
        assert_eq!(lex.max_key_length(), 2);
    }

    #[test]
    fn test_rejects_duplicate_key() {
        let result = Lexicon::new(vec![DictEntry::new("a", ["b"]), DictEntry::new("a", ["c"])]);
        assert!(matches!(result, Err(DictError::DuplicateKey(k)) if k == "a"));
    }

    #[test]
    fn test_rejects_empty_key_and_values() {
        assert!(matches!(
            Lexicon::new(vec![DictEntry::new("", ["x"])]),
            Err(DictError::EmptyKey)
        ));
        assert!(matches!(
            Lexicon::new(vec![DictEntry::new("x", Vec::<String>::new())]),
            Err(DictError::EmptyValue(_))
        ));
        assert!(matches!(
            Lexicon::new(vec![DictEntry::new("x", ["y", ""])]),
            Err(DictError::EmptyValue(_))
        ));
    }

    #[test]
    fn test_empty_lexicon_is_valid() {
        let lex = Lexicon::new(Vec::new()).unwrap();
        assert!(lex.is_empty());
        assert_eq!(lex.max_key_length(), 0);
    }
}
