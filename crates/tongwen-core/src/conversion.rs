//! Dictionary-driven substitution passes.

use std::borrow::Cow;

use crate::dict::DictRef;

/// One substitution pass over a span of text.
///
/// The pass runs its own greedy longest-match scan: matched keys are
/// replaced by their default value, everything else is copied through. The
/// scan never looks past the end of the span it is given.
#[derive(Clone)]
pub struct Conversion {
    dict: DictRef,
}

impl Conversion {
    pub fn new(dict: DictRef) -> Self {
        Self { dict }
    }

    pub fn dictionary(&self) -> &DictRef {
        &self.dict
    }

    /// Borrowed when no key matched anywhere in `text`.
    pub fn convert<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut out = String::new();
        if self.convert_into(text, &mut out) {
            Cow::Owned(out)
        } else {
            Cow::Borrowed(text)
        }
    }

    /// Append the converted `text` to `out`; returns whether any key matched.
    pub fn convert_into(&self, text: &str, out: &mut String) -> bool {
        out.reserve(text.len());
        let mut matched = false;
        // Start of the pending run of unmatched text.
        let mut copied = 0;
        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];
            match self.dict.longest_match(rest) {
                Some(m) if m.len > 0 => {
                    out.push_str(&text[copied..pos]);
                    out.push_str(m.default_value());
                    pos += m.len;
                    copied = pos;
                    matched = true;
                }
                _ => {
                    let Some(c) = rest.chars().next() else { break };
                    pos += c.len_utf8();
                }
            }
        }
        out.push_str(&text[copied..]);
        matched
    }
}

/// Ordered substitution passes; the output of one feeds the next.
///
/// An empty chain is the identity.
#[derive(Clone, Default)]
pub struct ConversionChain {
    stages: Vec<Conversion>,
}

impl ConversionChain {
    pub fn new(stages: Vec<Conversion>) -> Self {
        Self { stages }
    }

    pub fn from_dicts(dicts: impl IntoIterator<Item = DictRef>) -> Self {
        Self::new(dicts.into_iter().map(Conversion::new).collect())
    }

    pub fn stages(&self) -> &[Conversion] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn convert<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(text);
        for stage in &self.stages {
            let next = match stage.convert(&current) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(s) => s,
            };
            current = Cow::Owned(next);
        }
        current
    }

    pub fn convert_into(&self, text: &str, out: &mut String) {
        match self.stages.as_slice() {
            [] => out.push_str(text),
            [only] => {
                only.convert_into(text, out);
            }
            _ => out.push_str(&self.convert(text)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dict::{Backend, DictGroup, PhraseDictionary};

    fn dict(text: &str) -> DictRef {
        Arc::new(PhraseDictionary::from_text(text, Backend::Hashed).unwrap())
    }

    #[test]
    fn test_stage_replaces_default_value() {
        let stage = Conversion::new(dict("干\t幹 乾\n燥\t燥\n"));
        assert_eq!(stage.convert("干燥了"), "幹燥了");
    }

    #[test]
    fn test_stage_prefers_longest_key() {
        let stage = Conversion::new(dict("干\t幹 乾\n干燥\t乾燥\n"));
        assert_eq!(stage.convert("干燥干"), "乾燥幹");
    }

    #[test]
    fn test_stage_miss_is_borrowed() {
        let stage = Conversion::new(dict("a\tb\n"));
        assert!(matches!(stage.convert("中文"), Cow::Borrowed("中文")));
        let empty = Conversion::new(Arc::new(DictGroup::new(Vec::new())));
        assert!(matches!(empty.convert("任何文字"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_stage_scan_is_bounded_by_span() {
        let stage = Conversion::new(dict("ab\tX\n"));
        let mut out = String::new();
        for span in ["a", "b"] {
            stage.convert_into(span, &mut out);
        }
        assert_eq!(out, "ab");
        assert_eq!(stage.convert("ab"), "X");
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let chain = ConversionChain::default();
        assert!(chain.is_empty());
        assert_eq!(chain.convert("美国人"), "美国人");
        let mut out = String::from(">");
        chain.convert_into("abc", &mut out);
        assert_eq!(out, ">abc");
    }

    #[test]
    fn test_chain_feeds_output_forward() {
        let chain = ConversionChain::from_dicts([dict("台\t臺\n"), dict("臺\t台灣\n")]);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.convert("台"), "台灣");
    }

    #[test]
    fn test_chain_order_changes_result() {
        let a = dict("简\t簡\n");
        let b = dict("简體\t簡体\n");

        let ab = ConversionChain::from_dicts([a.clone(), b.clone()]);
        // Stage A rewrites 简 first, so stage B's key 简體 no longer occurs.
        assert_eq!(ab.convert("简體"), "簡體");

        let ba = ConversionChain::from_dicts([b, a]);
        assert_eq!(ba.convert("简體"), "簡体");
    }

    #[test]
    fn test_convert_into_matches_convert() {
        let chain = ConversionChain::from_dicts([dict("a\tb\n"), dict("b\tc\n")]);
        let mut out = String::new();
        chain.convert_into("xab", &mut out);
        assert_eq!(out, chain.convert("xab"));
        assert_eq!(out, "xcc");
    }
}
