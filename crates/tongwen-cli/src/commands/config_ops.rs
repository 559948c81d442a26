use std::path::Path;

use tongwen::{load_config, DictFormat};

pub fn config_validate(file: &str) {
    let path = Path::new(file);
    let cfg = die!(load_config(path), "Error: {}");
    let base_dir = path.parent().unwrap_or(Path::new("."));
    let stages = cfg
        .conversion_chain
        .iter()
        .filter(|s| !s.dicts.is_empty())
        .count();
    println!(
        "OK: name={:?}, segmentation dicts={}, conversion stages={}",
        cfg.name,
        cfg.segmentation.dicts.len(),
        stages
    );
    let all = cfg
        .conversion_chain
        .iter()
        .chain(std::iter::once(&cfg.segmentation))
        .flat_map(|s| s.dicts.iter());
    for spec in all {
        let path = spec.resolve(base_dir);
        if !path.exists() {
            let format = match spec.format {
                DictFormat::Text => "text",
                DictFormat::Array => "array",
                DictFormat::Hashed => "hashed",
            };
            eprintln!("warning: {} ({format}) does not exist", path.display());
        }
    }
}
