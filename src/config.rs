//! Converter configuration loaded from TOML.
//!
//! ```toml
//! name = "Simplified to Traditional"
//!
//! [segmentation]
//! dicts = [{ file = "STPhrases.txt", format = "text" }]
//!
//! [[conversion_chain]]
//! dicts = [{ file = "STPhrases.twd" }, { file = "STCharacters.twd", format = "array" }]
//! ```
//!
//! A segmentation or stage naming several dictionaries queries them as one
//! group, earliest first on ties. Stages with no dictionaries are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tongwen_core::{Backend, DictSource};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConverterConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub segmentation: StageConfig,
    #[serde(default)]
    pub conversion_chain: Vec<StageConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    #[serde(default)]
    pub dicts: Vec<DictSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DictSpec {
    pub file: PathBuf,
    #[serde(default)]
    pub format: DictFormat,
}

/// On-disk form of a configured dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DictFormat {
    /// Line-format source, built into a double-array trie at load time.
    Text,
    Array,
    #[default]
    Hashed,
}

impl DictSpec {
    /// `file` joined onto `base_dir` unless it is absolute.
    pub fn resolve(&self, base_dir: &Path) -> PathBuf {
        if self.file.is_absolute() {
            self.file.clone()
        } else {
            base_dir.join(&self.file)
        }
    }

    pub fn source(&self, base_dir: &Path) -> DictSource {
        let path = self.resolve(base_dir);
        match self.format {
            DictFormat::Text => DictSource::TextFile {
                path,
                backend: Backend::DoubleArray,
            },
            DictFormat::Array => DictSource::Compiled {
                path,
                backend: Backend::DoubleArray,
            },
            DictFormat::Hashed => DictSource::Compiled {
                path,
                backend: Backend::Hashed,
            },
        }
    }
}

pub fn parse_config_toml(toml_str: &str) -> Result<ConverterConfig, ConfigError> {
    let cfg: ConverterConfig =
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&cfg)?;
    Ok(cfg)
}

pub fn load_config(path: &Path) -> Result<ConverterConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_toml(&content)
}

fn validate(cfg: &ConverterConfig) -> Result<(), ConfigError> {
    if cfg.segmentation.dicts.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "segmentation.dicts".to_string(),
            reason: "at least one segmentation dictionary is required".to_string(),
        });
    }
    let stages = std::iter::once(("segmentation".to_string(), &cfg.segmentation)).chain(
        cfg.conversion_chain
            .iter()
            .enumerate()
            .map(|(i, s)| (format!("conversion_chain[{i}]"), s)),
    );
    for (section, stage) in stages {
        for (j, spec) in stage.dicts.iter().enumerate() {
            if spec.file.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("{section}.dicts[{j}].file"),
                    reason: "must not be empty".to_string(),
                });
            }
        }
    }
    Ok(())
}
