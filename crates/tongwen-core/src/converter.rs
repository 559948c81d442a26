//! Named segmentation + conversion pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, debug_span};

use crate::conversion::ConversionChain;
use crate::dict::{Backend, DictError, DictGroup, DictRef, PhraseDictionary};
use crate::error::ErrorKind;
use crate::segment::MaxMatchSegmenter;

#[derive(Debug, thiserror::Error)]
pub enum ConverterError {
    #[error("converter has no segmentation dictionary")]
    MissingSegmentation,

    #[error("segmentation dictionary: {0}")]
    Segmentation(#[source] DictError),

    #[error("conversion stage {index}: {source}")]
    Stage {
        index: usize,
        #[source]
        source: DictError,
    },
}

impl ConverterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSegmentation => ErrorKind::Unknown,
            Self::Segmentation(e) | Self::Stage { source: e, .. } => e.kind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("input is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUtf8 { .. } => ErrorKind::InvalidUtf8,
        }
    }
}

/// Where a converter dependency comes from.
#[derive(Clone)]
pub enum DictSource {
    /// An already built dictionary or group, shared as is.
    Shared(DictRef),
    /// Line-format dictionary content, built into the double-array backend.
    Text(String),
    TextFile { path: PathBuf, backend: Backend },
    Compiled { path: PathBuf, backend: Backend },
    /// Members queried as one priority-ordered group.
    Group(Vec<DictSource>),
}

impl DictSource {
    pub fn load(&self) -> Result<DictRef, DictError> {
        let dict: DictRef = match self {
            Self::Shared(dict) => dict.clone(),
            Self::Text(content) => Arc::new(PhraseDictionary::from_text(content, Backend::DoubleArray)?),
            Self::TextFile { path, backend } => Arc::new(PhraseDictionary::open_text(path, *backend)?),
            Self::Compiled { path, backend } => Arc::new(PhraseDictionary::open(path, *backend)?),
            Self::Group(members) => {
                let members = members.iter().map(Self::load).collect::<Result<Vec<_>, _>>()?;
                Arc::new(DictGroup::new(members))
            }
        };
        Ok(dict)
    }
}

impl From<DictRef> for DictSource {
    fn from(dict: DictRef) -> Self {
        Self::Shared(dict)
    }
}

/// Segments input with one dictionary, then runs every segment through a
/// conversion chain and concatenates the results.
///
/// Immutable once built; `convert` may be called from many threads at once.
#[derive(Clone)]
pub struct Converter {
    name: String,
    segmenter: MaxMatchSegmenter,
    chain: ConversionChain,
}

impl Converter {
    pub fn new(name: impl Into<String>, segmentation: DictRef, conversions: Vec<DictRef>) -> Self {
        let converter = Self {
            name: name.into(),
            segmenter: MaxMatchSegmenter::new(segmentation),
            chain: ConversionChain::from_dicts(conversions),
        };
        debug!(name = %converter.name, stages = converter.chain.len(), "converter ready");
        converter
    }

    /// Load every source and build the converter, failing on the first
    /// source that does not load.
    pub fn create(
        name: impl Into<String>,
        segmentation: &DictSource,
        conversions: &[DictSource],
    ) -> Result<Self, ConverterError> {
        let seg = segmentation.load().map_err(ConverterError::Segmentation)?;
        let stages = conversions
            .iter()
            .enumerate()
            .map(|(index, source)| {
                source
                    .load()
                    .map_err(|source| ConverterError::Stage { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(name, seg, stages))
    }

    pub fn builder(name: impl Into<String>) -> ConverterBuilder {
        ConverterBuilder {
            name: name.into(),
            segmentation: None,
            conversions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segmenter(&self) -> &MaxMatchSegmenter {
        &self.segmenter
    }

    pub fn chain(&self) -> &ConversionChain {
        &self.chain
    }

    pub fn convert(&self, text: &str) -> String {
        let _span = debug_span!("convert", bytes = text.len()).entered();
        let mut out = String::with_capacity(text.len());
        let mut tokens = 0usize;
        for token in self.segmenter.segment(text) {
            self.chain.convert_into(token.text(text), &mut out);
            tokens += 1;
        }
        debug!(tokens, out_bytes = out.len());
        out
    }

    /// Convert raw bytes; nothing is converted unless all of `input` is
    /// valid UTF-8.
    pub fn convert_bytes(&self, input: &[u8]) -> Result<String, ConvertError> {
        let text = std::str::from_utf8(input).map_err(|e| ConvertError::InvalidUtf8 {
            valid_up_to: e.valid_up_to(),
        })?;
        Ok(self.convert(text))
    }
}

/// Incremental construction of a [`Converter`] from dictionary sources.
pub struct ConverterBuilder {
    name: String,
    segmentation: Option<DictSource>,
    conversions: Vec<DictSource>,
}

impl ConverterBuilder {
    pub fn segmentation(mut self, source: impl Into<DictSource>) -> Self {
        self.segmentation = Some(source.into());
        self
    }

    /// Append one conversion stage; stages run in the order added.
    pub fn stage(mut self, source: impl Into<DictSource>) -> Self {
        self.conversions.push(source.into());
        self
    }

    pub fn build(self) -> Result<Converter, ConverterError> {
        let segmentation = self
            .segmentation
            .ok_or(ConverterError::MissingSegmentation)?;
        Converter::create(self.name, &segmentation, &self.conversions)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn text(s: &str) -> DictSource {
        DictSource::Text(s.to_string())
    }

    #[test]
    fn test_end_to_end_example() {
        let converter = Converter::builder("s2t")
            .segmentation(text("美国\t美国\n人\t人\n"))
            .stage(text("美国\t美國\n"))
            .build()
            .unwrap();
        assert_eq!(converter.name(), "s2t");
        let tokens: Vec<&str> = converter
            .segmenter()
            .segment("美国人")
            .map(|t| &"美国人"[t.bytes])
            .collect();
        assert_eq!(tokens, vec!["美国", "人"]);
        assert_eq!(converter.convert("美国人"), "美國人");
    }

    #[test]
    fn test_segmentation_blocks_cross_boundary_match() {
        // 美国 is one segment, so the stage never sees 国人 inside one span.
        let converter = Converter::builder("t")
            .segmentation(text("美国\tx\n"))
            .stage(text("国人\tWRONG\n"))
            .build()
            .unwrap();
        assert_eq!(converter.convert("美国人"), "美国人");
        assert_eq!(converter.chain().convert("美国人"), "美WRONG");
    }

    #[test]
    fn test_missing_segmentation() {
        let err = Converter::builder("x").stage(text("a\tb\n")).build().err().unwrap();
        assert!(matches!(err, ConverterError::MissingSegmentation));
    }

    #[test]
    fn test_invalid_stage_fails_construction() {
        let err = Converter::builder("x")
            .segmentation(text("a\tb\n"))
            .stage(text("a\tb\n"))
            .stage(DictSource::Compiled {
                path: Path::new("/nonexistent/TWPhrases.twd").to_path_buf(),
                backend: Backend::Hashed,
            })
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ConverterError::Stage { index: 1, .. }));
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }

    #[test]
    fn test_invalid_segmentation_text() {
        let err = Converter::create("x", &text("a\tb\na\tc\n"), &[]).err().unwrap();
        assert!(matches!(err, ConverterError::Segmentation(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidTextDictionary);
    }

    #[test]
    fn test_group_source() {
        let converter = Converter::builder("g")
            .segmentation(DictSource::Group(vec![text("干燥\tx\n"), text("干\tx\n")]))
            .stage(DictSource::Group(vec![text("干\t幹\n"), text("干燥\t乾燥\n")]))
            .build()
            .unwrap();
        assert_eq!(converter.convert("干燥干"), "乾燥幹");
    }

    #[test]
    fn test_no_stages_is_identity() {
        let converter = Converter::create("id", &text("美国\tx\n"), &[]).unwrap();
        assert_eq!(converter.convert("美国人"), "美国人");
    }

    #[test]
    fn test_convert_bytes_rejects_invalid_utf8() {
        let converter = Converter::create("x", &text("a\tb\n"), &[text("a\tb\n")]).unwrap();
        assert_eq!(converter.convert_bytes(b"aa").unwrap(), "bb");
        let err = converter.convert_bytes(b"ab\xffa").unwrap_err();
        assert_eq!(err, ConvertError::InvalidUtf8 { valid_up_to: 2 });
        assert_eq!(err.kind(), ErrorKind::InvalidUtf8);
    }

    #[test]
    fn test_shared_across_threads() {
        let converter = Arc::new(
            Converter::create("x", &text("美国\tx\n"), &[text("美国\t美國\n")]).unwrap(),
        );
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&converter);
                std::thread::spawn(move || c.convert("美国人"))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), "美國人");
        }
    }
}
