use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use tongwen_core::dict::{Backend, DictError, Dictionary, PhraseDictionary};
use tongwen_core::MaxMatchSegmenter;
use tracing::debug;

/// Open a dictionary by extension: `.txt` is the line format (built into a
/// double-array trie), anything else a compiled file of either backend.
pub fn open_any(path: &Path) -> Result<PhraseDictionary, DictError> {
    if path.extension().is_some_and(|e| e == "txt") {
        PhraseDictionary::open_text(path, Backend::DoubleArray)
    } else {
        PhraseDictionary::open_detect(path)
    }
}

/// Build `input` (line format) into a compiled dictionary at `output`.
/// Returns (key_count, value_count).
pub fn compile_file(input: &Path, output: &Path, backend: Backend) -> Result<(usize, usize), DictError> {
    let dict = PhraseDictionary::open_text(input, backend)?;
    dict.save(output)?;
    debug!(input = %input.display(), output = %output.display(), %backend, "compiled");
    Ok(dict.stats())
}

/// Render a dictionary back to the line format.
pub fn decompile_to_text(input: &Path) -> Result<String, DictError> {
    Ok(open_any(input)?.to_lexicon()?.to_text())
}

pub fn compile(input: &str, output: &str, backend: Backend) {
    eprintln!("Building {backend} trie from {input}...");
    let (keys, values) = die!(
        compile_file(Path::new(input), Path::new(output), backend),
        "Error compiling dictionary: {}"
    );
    let file_size = fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    eprintln!("Wrote {output}: {keys} keys, {values} values ({file_size} bytes)");
}

pub fn decompile(input: &str, output: Option<&str>) {
    let text = die!(decompile_to_text(Path::new(input)), "Error: {}");
    match output {
        Some(path) => {
            die!(fs::write(path, &text), "Error writing {path}: {}");
            eprintln!("Wrote {path}");
        }
        None => {
            die!(io::stdout().write_all(text.as_bytes()), "Error writing output: {}");
        }
    }
}

pub fn info(file: &str) {
    let dict = die!(open_any(Path::new(file)), "Error opening dictionary: {}");
    let (keys, values) = dict.stats();
    let file_size = fs::metadata(file).map(|m| m.len()).unwrap_or(0);
    println!("File:            {file}");
    println!("Backend:         {}", dict.backend());
    println!("Size:            {file_size} bytes");
    println!("Keys:            {keys}");
    println!("Values:          {values}");
    println!("Max key length:  {}", dict.max_key_length());
}

pub fn lookup(file: &str, key: &str) {
    let dict = die!(open_any(Path::new(file)), "Error opening dictionary: {}");
    match dict.lookup(key) {
        Some(values) => {
            for (i, v) in values.iter().enumerate() {
                println!("{:>2}: {v}", i + 1);
            }
        }
        None => println!("(not found: {key})"),
    }
}

pub fn prefix(file: &str, query: &str, predict: Option<usize>) {
    let dict = die!(open_any(Path::new(file)), "Error opening dictionary: {}");
    match predict {
        Some(limit) => {
            let results = die!(dict.predict(query, limit), "Error reading dictionary: {}");
            if results.is_empty() {
                println!("(no keys start with {query})");
            }
            for (key, values) in results {
                println!("{key}\t{}", values.join(" "));
            }
        }
        None => {
            let matches = dict.common_prefix_matches(query);
            if matches.is_empty() {
                println!("(no prefix of {query} is a key)");
            }
            for m in matches {
                println!("{}\t{}", &query[..m.len], m.values.join(" "));
            }
        }
    }
}

/// Segment `text` and return the token strings.
pub fn segment_text(dict: PhraseDictionary, text: &str) -> Vec<String> {
    let segmenter = MaxMatchSegmenter::new(Arc::new(dict));
    segmenter
        .segment(text)
        .map(|t| t.text(text).to_string())
        .collect()
}

pub fn segment(file: &str, text: &str) {
    let dict = die!(open_any(Path::new(file)), "Error opening dictionary: {}");
    println!("{}", segment_text(dict, text).join(" / "));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_decompile_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("STPhrases.txt");
        fs::write(&src, "美国\t美國\n干燥\t乾燥\n干\t幹 乾\n").unwrap();
        for backend in [Backend::DoubleArray, Backend::Hashed] {
            let out = dir.path().join(format!("STPhrases-{backend}.twd"));
            let (keys, values) = compile_file(&src, &out, backend).unwrap();
            assert_eq!((keys, values), (3, 4));
            let dict = open_any(&out).unwrap();
            assert_eq!(dict.backend(), backend);
            assert_eq!(
                decompile_to_text(&out).unwrap(),
                "干\t幹 乾\n干燥\t乾燥\n美国\t美國\n"
            );
        }
    }

    #[test]
    fn open_any_text() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("seg.txt");
        fs::write(&src, "美国\tx\n").unwrap();
        let dict = open_any(&src).unwrap();
        assert_eq!(dict.backend(), Backend::DoubleArray);
        assert_eq!(segment_text(dict, "美国人"), vec!["美国", "人"]);
    }

    #[test]
    fn compile_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = compile_file(
            &dir.path().join("missing.txt"),
            &dir.path().join("out.twd"),
            Backend::Hashed,
        )
        .unwrap_err();
        assert!(matches!(err, DictError::FileNotFound(_)));
    }
}
