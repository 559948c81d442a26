//! Conversion between Chinese script variants.
//!
//! The engine lives in `tongwen-core`; this crate adds what an embedding
//! application needs on top: a cached [`DictionaryLoader`] for the bundled
//! dictionary set, preset [`Options`], TOML converter configuration and the
//! [`ScriptConverter`] handle.
//!
//! ```no_run
//! use tongwen::{DictionaryLoader, Options, ScriptConverter};
//!
//! let loader = DictionaryLoader::new("/usr/share/tongwen");
//! let s2tw = ScriptConverter::new(Options::TRADITIONALIZE | Options::TW_STANDARD, &loader)?;
//! assert_eq!(s2tw.convert("汉字"), "漢字");
//! # Ok::<(), tongwen::ConverterError>(())
//! ```

pub mod config;
pub mod loader;
pub mod preset;
pub mod script;
mod trace_init;

pub use config::{load_config, parse_config_toml, ConfigError, ConverterConfig, DictFormat, DictSpec};
pub use loader::DictionaryLoader;
pub use preset::{DictionaryName, Options, PRESETS};
pub use script::ScriptConverter;
pub use trace_init::init_tracing;

pub use tongwen_core::{
    Backend, ConvertError, Converter, ConverterError, DictError, DictRef, Dictionary, ErrorKind,
    PhraseDictionary,
};
