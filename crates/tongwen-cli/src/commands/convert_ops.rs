use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tongwen::{load_config, DictionaryLoader, Options, ScriptConverter};

/// Where converter dictionaries come from.
pub enum ConverterSpec<'a> {
    /// A TOML configuration; relative paths resolve against its directory.
    Config(&'a Path),
    /// A named preset over the bundled `<Name>.twd` set in a directory.
    Preset { options: Options, dict_dir: &'a Path },
}

pub fn build_converter(spec: ConverterSpec<'_>) -> Result<ScriptConverter, String> {
    match spec {
        ConverterSpec::Config(path) => {
            let cfg = load_config(path).map_err(|e| e.to_string())?;
            let base_dir = path
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
            let loader = DictionaryLoader::new(&base_dir);
            ScriptConverter::from_config(&cfg, &base_dir, &loader).map_err(|e| e.to_string())
        }
        ConverterSpec::Preset { options, dict_dir } => {
            let loader = DictionaryLoader::new(dict_dir);
            ScriptConverter::new(options, &loader).map_err(|e| e.to_string())
        }
    }
}

pub fn convert_cmd(spec: ConverterSpec<'_>, text: Option<&str>) {
    let converter = die!(build_converter(spec), "Error building converter: {}");
    let output = match text {
        Some(text) => converter.convert(text),
        None => {
            let mut input = Vec::new();
            die!(io::stdin().read_to_end(&mut input), "Error reading stdin: {}");
            die!(converter.convert_bytes(&input), "Error: {}")
        }
    };
    if text.is_some() {
        println!("{output}");
    } else {
        print!("{output}");
    }
}
