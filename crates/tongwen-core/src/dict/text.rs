//! Line-oriented source format: `key<TAB>value[ value...]`, one entry per
//! line. Blank lines are skipped, a trailing `\r` is tolerated and a
//! leading byte-order mark is ignored.

use super::entry::check_entry;
use super::{DictEntry, DictError, Lexicon};

impl Lexicon {
    pub fn from_text(content: &str) -> Result<Self, DictError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut parsed: Vec<(DictEntry, usize)> = Vec::new();
        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.is_empty() {
                continue;
            }
            let entry = parse_line(line).map_err(|reason| DictError::InvalidText {
                line: line_no,
                reason,
            })?;
            parsed.push((entry, line_no));
        }

        // Stable sort keeps the first occurrence ahead of its duplicates so
        // the error can point at the later line.
        parsed.sort_by(|a, b| a.0.key.as_bytes().cmp(b.0.key.as_bytes()));
        if let Some(w) = parsed.windows(2).find(|w| w[0].0.key == w[1].0.key) {
            return Err(DictError::InvalidText {
                line: w[1].1,
                reason: format!("duplicate key {:?} (first on line {})", w[1].0.key, w[0].1),
            });
        }
        Ok(Lexicon::from_sorted_unchecked(
            parsed.into_iter().map(|(e, _)| e).collect(),
        ))
    }

    pub fn from_text_bytes(bytes: &[u8]) -> Result<Self, DictError> {
        let content = std::str::from_utf8(bytes).map_err(|_| DictError::InvalidUtf8)?;
        Self::from_text(content)
    }

    /// Render back to the line format, one entry per line in key order.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for e in self.entries() {
            out.push_str(&e.key);
            out.push('\t');
            out.push_str(&e.values.join(" "));
            out.push('\n');
        }
        out
    }
}

fn parse_line(line: &str) -> Result<DictEntry, String> {
    let (key, rest) = line
        .split_once('\t')
        .ok_or_else(|| "missing tab between key and values".to_string())?;
    if rest.contains('\t') {
        return Err("values must be separated by spaces, found a second tab".into());
    }
    let entry = DictEntry {
        key: key.to_string(),
        values: rest
            .split(' ')
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
    };
    check_entry(&entry).map_err(|e| e.to_string())?;
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let lex = Lexicon::from_text("美国\t美國\n干\t幹 乾 干\n").unwrap();
        assert_eq!(lex.len(), 2);
        let gan = lex.get("干").unwrap();
        assert_eq!(gan.values, vec!["幹", "乾", "干"]);
    }

    #[test]
    fn test_tolerates_crlf_bom_and_blank_lines() {
        let lex = Lexicon::from_text("\u{feff}a\tb\r\n\r\n\nc\td e\r\n").unwrap();
        assert_eq!(lex.get("a").unwrap().values, vec!["b"]);
        assert_eq!(lex.get("c").unwrap().values, vec!["d", "e"]);
    }

    #[test]
    fn test_extra_spaces_between_values() {
        let lex = Lexicon::from_text("a\t b  c \n").unwrap();
        assert_eq!(lex.get("a").unwrap().values, vec!["b", "c"]);
    }

    #[test]
    fn test_missing_tab_reports_line() {
        let err = Lexicon::from_text("a\tb\nno tab here\n").unwrap_err();
        assert!(matches!(err, DictError::InvalidText { line: 2, .. }));
    }

    #[test]
    fn test_empty_key_and_value_rejected() {
        assert!(matches!(
            Lexicon::from_text("\tb\n"),
            Err(DictError::InvalidText { line: 1, .. })
        ));
        assert!(matches!(
            Lexicon::from_text("a\t  \n"),
            Err(DictError::InvalidText { line: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_key_points_at_later_line() {
        let err = Lexicon::from_text("a\tb\nx\ty\na\tc\n").unwrap_err();
        match err {
            DictError::InvalidText { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("line 1"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8_bytes() {
        let result = Lexicon::from_text_bytes(b"a\t\xff\xfe\n");
        assert!(matches!(result, Err(DictError::InvalidUtf8)));
    }

    #[test]
    fn test_to_text_is_sorted_and_reparses() {
        let lex = Lexicon::from_text("b\tc\na\tx y\n").unwrap();
        let text = lex.to_text();
        assert_eq!(text, "a\tx y\nb\tc\n");
        assert_eq!(Lexicon::from_text(&text).unwrap(), lex);
    }
}
