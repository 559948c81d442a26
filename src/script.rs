use std::path::Path;
use std::sync::Arc;

use tongwen_core::{ConvertError, Converter, ConverterError, DictError, DictGroup, DictRef};
use tracing::debug;

use crate::config::{ConverterConfig, DictSpec};
use crate::loader::DictionaryLoader;
use crate::preset::{Options, PRESETS};

/// A ready-to-use converter between script variants.
///
/// Cheap to clone; clones share the underlying dictionaries.
#[derive(Clone)]
pub struct ScriptConverter {
    converter: Arc<Converter>,
}

impl ScriptConverter {
    /// Build from preset options using the loader's dictionary set.
    pub fn new(options: Options, loader: &DictionaryLoader) -> Result<Self, ConverterError> {
        let segmentation = loader
            .segmentation(options)
            .map_err(ConverterError::Segmentation)?;
        let mut chain = Vec::new();
        for (index, names) in options.conversion_chain().iter().enumerate() {
            let stage = loader
                .stage(names)
                .map_err(|source| ConverterError::Stage { index, source })?;
            chain.extend(stage);
        }
        let name = PRESETS
            .iter()
            .find(|(_, o)| *o == options)
            .map_or_else(|| format!("options:{:#04x}", options.bits()), |(n, _)| n.to_string());
        debug!(%name, stages = chain.len(), "script converter built from options");
        Ok(Self::from_converter(Converter::new(name, segmentation, chain)))
    }

    /// Build from a parsed configuration; relative dictionary paths are
    /// resolved against `base_dir`.
    pub fn from_config(
        config: &ConverterConfig,
        base_dir: &Path,
        loader: &DictionaryLoader,
    ) -> Result<Self, ConverterError> {
        let segmentation = load_stage(&config.segmentation.dicts, base_dir, loader)
            .map_err(ConverterError::Segmentation)?;
        let mut chain = Vec::with_capacity(config.conversion_chain.len());
        for (index, stage) in config.conversion_chain.iter().enumerate() {
            if stage.dicts.is_empty() {
                continue;
            }
            let dict = load_stage(&stage.dicts, base_dir, loader)
                .map_err(|source| ConverterError::Stage { index, source })?;
            chain.push(dict);
        }
        Ok(Self::from_converter(Converter::new(
            config.name.clone(),
            segmentation,
            chain,
        )))
    }

    pub fn from_converter(converter: Converter) -> Self {
        Self {
            converter: Arc::new(converter),
        }
    }

    pub fn name(&self) -> &str {
        self.converter.name()
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn convert(&self, text: &str) -> String {
        self.converter.convert(text)
    }

    pub fn convert_bytes(&self, input: &[u8]) -> Result<String, ConvertError> {
        self.converter.convert_bytes(input)
    }
}

fn load_stage(
    specs: &[DictSpec],
    base_dir: &Path,
    loader: &DictionaryLoader,
) -> Result<DictRef, DictError> {
    match specs {
        [only] => loader.load_spec(only, base_dir),
        _ => {
            let members = specs
                .iter()
                .map(|s| loader.load_spec(s, base_dir))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Arc::new(DictGroup::new(members)) as DictRef)
        }
    }
}
