//! Greedy longest-match segmentation.

use std::iter::FusedIterator;
use std::ops::Range;

use crate::dict::{DictRef, Dictionary};

/// One segment of the input, as both code-point and byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub chars: Range<usize>,
    pub bytes: Range<usize>,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.bytes.clone()]
    }

    pub fn char_len(&self) -> usize {
        self.chars.len()
    }
}

/// Splits text at the boundaries of the longest dictionary keys.
///
/// At each position the longest matching key becomes one token; where no
/// key matches, the single code point does. Tokens are therefore
/// contiguous, non-overlapping and cover the whole input.
#[derive(Clone)]
pub struct MaxMatchSegmenter {
    dict: DictRef,
}

impl MaxMatchSegmenter {
    pub fn new(dict: DictRef) -> Self {
        Self { dict }
    }

    pub fn dictionary(&self) -> &DictRef {
        &self.dict
    }

    /// Lazily segment `text`. Calling again restarts from the beginning.
    pub fn segment<'a>(&'a self, text: &'a str) -> Segments<'a> {
        Segments {
            dict: self.dict.as_ref(),
            text,
            byte_pos: 0,
            char_pos: 0,
        }
    }
}

/// Iterator over the tokens of one input.
#[derive(Clone)]
pub struct Segments<'a> {
    dict: &'a dyn Dictionary,
    text: &'a str,
    byte_pos: usize,
    char_pos: usize,
}

impl Iterator for Segments<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let rest = &self.text[self.byte_pos..];
        let (byte_len, char_len) = match self.dict.longest_match(rest) {
            Some(m) if m.len > 0 => (m.len, m.char_len),
            _ => (rest.chars().next()?.len_utf8(), 1),
        };
        let token = Token {
            chars: self.char_pos..self.char_pos + char_len,
            bytes: self.byte_pos..self.byte_pos + byte_len,
        };
        self.byte_pos += byte_len;
        self.char_pos += char_len;
        Some(token)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.text.len() - self.byte_pos;
        // Every token consumes between one code point and the whole rest.
        (usize::from(remaining > 0), Some(remaining))
    }
}

impl FusedIterator for Segments<'_> {}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::*;
    use crate::dict::{Backend, DictGroup, PhraseDictionary};

    fn segmenter(text: &str) -> MaxMatchSegmenter {
        MaxMatchSegmenter::new(Arc::new(
            PhraseDictionary::from_text(text, Backend::DoubleArray).unwrap(),
        ))
    }

    fn words(seg: &MaxMatchSegmenter, input: &str) -> Vec<String> {
        seg.segment(input).map(|t| t.text(input).to_string()).collect()
    }

    #[test]
    fn test_segment_longest_first() {
        let seg = segmenter("美国\t美國\n人\t人\n美\t美\n");
        assert_eq!(words(&seg, "美国人"), vec!["美国", "人"]);
    }

    #[test]
    fn test_unmatched_code_points_are_single_tokens() {
        let seg = segmenter("美国\t美國\n");
        let tokens: Vec<Token> = seg.segment("a美国𠀀").collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].chars, 0..1);
        assert_eq!(tokens[1].chars, 1..3);
        assert_eq!(tokens[1].bytes, 1..7);
        assert_eq!(tokens[2].chars, 3..4);
        assert_eq!(tokens[2].bytes, 7..11);
    }

    #[test]
    fn test_empty_input() {
        let seg = segmenter("a\tb\n");
        assert_eq!(seg.segment("").next(), None);
    }

    #[test]
    fn test_restartable() {
        let seg = segmenter("ab\tx\n");
        let first: Vec<Token> = seg.segment("abab").collect();
        let again: Vec<Token> = seg.segment("abab").collect();
        assert_eq!(first, again);
        let mut it = seg.segment("abab");
        it.next();
        let rest: Vec<Token> = it.clone().collect();
        assert_eq!(rest, first[1..]);
    }

    #[test]
    fn test_empty_group_segments_per_code_point() {
        let seg = MaxMatchSegmenter::new(Arc::new(DictGroup::new(Vec::new())));
        assert_eq!(words(&seg, "中文ab"), vec!["中", "文", "a", "b"]);
    }

    #[test]
    fn test_fused_after_end() {
        let seg = segmenter("a\tb\n");
        let mut it = seg.segment("a");
        assert!(it.next().is_some());
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }

    const ALPHABET: [char; 5] = ['a', 'b', '中', '国', '𠀀'];

    fn arb_word(max_len: usize) -> impl Strategy<Value = String> {
        prop::collection::vec(prop::sample::select(ALPHABET.to_vec()), 1..=max_len)
            .prop_map(|cs| cs.into_iter().collect())
    }

    fn arb_dict_text() -> impl Strategy<Value = String> {
        prop::collection::btree_set(arb_word(4), 0..16).prop_map(|keys| {
            keys.into_iter().map(|k| format!("{k}\tx\n")).collect()
        })
    }

    proptest! {
        #[test]
        fn tokens_cover_input(dict in arb_dict_text(), text in "[ab中国𠀀]{0,16}") {
            let seg = segmenter(&dict);
            let mut bytes = 0;
            let mut chars = 0;
            let mut joined = String::new();
            for token in seg.segment(&text) {
                prop_assert_eq!(token.bytes.start, bytes);
                prop_assert_eq!(token.chars.start, chars);
                prop_assert!(!token.bytes.is_empty());
                bytes = token.bytes.end;
                chars = token.chars.end;
                joined.push_str(token.text(&text));
            }
            prop_assert_eq!(bytes, text.len());
            prop_assert_eq!(chars, text.chars().count());
            prop_assert_eq!(joined, text);
        }

        #[test]
        fn tokens_are_greedy_maximal(dict in arb_dict_text(), text in "[ab中国𠀀]{0,16}") {
            let keys: Vec<&str> = dict.lines().filter_map(|l| l.split('\t').next()).collect();
            let seg = segmenter(&dict);
            for token in seg.segment(&text) {
                let rest = &text[token.bytes.start..];
                let longest = keys
                    .iter()
                    .filter(|k| rest.starts_with(**k))
                    .map(|k| k.chars().count())
                    .max()
                    .unwrap_or(1);
                prop_assert_eq!(token.char_len(), longest);
            }
        }
    }
}
