use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tongwen_core::{DictError, DictGroup, DictRef, Dictionary, PhraseDictionary};
use tracing::debug;

use crate::config::{DictFormat, DictSpec};
use crate::preset::{DictionaryName, Options};

/// Loads dictionaries from one directory and shares them between converters.
///
/// Loaded dictionaries are cached by resolved path, so building many
/// converters over the same dictionary set only reads each file once.
pub struct DictionaryLoader {
    dir: PathBuf,
    cache: Mutex<HashMap<CacheKey, DictRef>>,
}

/// Resolved path plus configured format; `None` for bundled dictionaries.
type CacheKey = (PathBuf, Option<DictFormat>);

impl DictionaryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: DictionaryName) -> PathBuf {
        self.dir.join(name.file_name())
    }

    /// A bundled dictionary by name; the backend is read from the file.
    pub fn dict(&self, name: DictionaryName) -> Result<DictRef, DictError> {
        let path = self.path_of(name);
        self.cached((path, None), |path| {
            Ok(Arc::new(PhraseDictionary::open_detect(path)?) as DictRef)
        })
    }

    /// A configured dictionary, relative paths resolved against `base_dir`.
    pub fn load_spec(&self, spec: &DictSpec, base_dir: &Path) -> Result<DictRef, DictError> {
        let path = spec.resolve(base_dir);
        let source = spec.source(base_dir);
        self.cached((path, Some(spec.format)), |_| source.load())
    }

    pub fn segmentation(&self, options: Options) -> Result<DictRef, DictError> {
        self.dict(options.segmentation_dict())
    }

    /// One conversion stage: nothing for no names, the dictionary itself
    /// for one name, a group for several.
    pub fn stage(&self, names: &[DictionaryName]) -> Result<Option<DictRef>, DictError> {
        Ok(match names {
            [] => None,
            [name] => Some(self.dict(*name)?),
            _ => {
                let members = names
                    .iter()
                    .map(|&n| self.dict(n))
                    .collect::<Result<Vec<_>, _>>()?;
                Some(Arc::new(DictGroup::new(members)) as DictRef)
            }
        })
    }

    pub fn conversion_chain(&self, options: Options) -> Result<Vec<DictRef>, DictError> {
        let mut stages = Vec::new();
        for names in options.conversion_chain() {
            stages.extend(self.stage(&names)?);
        }
        Ok(stages)
    }

    pub fn cached_count(&self) -> usize {
        self.lock().len()
    }

    pub fn clear_cache(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, DictRef>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached(
        &self,
        key: CacheKey,
        load: impl FnOnce(&Path) -> Result<DictRef, DictError>,
    ) -> Result<DictRef, DictError> {
        if let Some(dict) = self.lock().get(&key) {
            return Ok(dict.clone());
        }
        // Loading happens outside the lock; a racing thread may load the
        // same file, and the first insert wins.
        let dict = load(&key.0)?;
        debug!(path = %key.0.display(), entries = dict.len(), "dictionary loaded");
        Ok(self.lock().entry(key).or_insert(dict).clone())
    }
}

#[cfg(test)]
mod tests {
    use tongwen_core::{Backend, ErrorKind};

    use super::*;

    fn write_dict(dir: &Path, name: DictionaryName, text: &str, backend: Backend) {
        PhraseDictionary::from_text(text, backend)
            .unwrap()
            .save(&dir.join(name.file_name()))
            .unwrap();
    }

    #[test]
    fn dict_is_cached_by_path() {
        let dir = tempfile::tempdir().unwrap();
        write_dict(dir.path(), DictionaryName::STPhrases, "美国\t美國\n", Backend::Hashed);
        let loader = DictionaryLoader::new(dir.path());
        let a = loader.dict(DictionaryName::STPhrases).unwrap();
        let b = loader.dict(DictionaryName::STPhrases).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(loader.cached_count(), 1);
        loader.clear_cache();
        assert_eq!(loader.cached_count(), 0);
    }

    #[test]
    fn missing_dict_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DictionaryLoader::new(dir.path());
        let err = loader.dict(DictionaryName::TWPhrases).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(loader.cached_count(), 0);
    }

    #[test]
    fn chain_groups_multi_name_stages() {
        let dir = tempfile::tempdir().unwrap();
        write_dict(dir.path(), DictionaryName::STPhrases, "干燥\t乾燥\n", Backend::Hashed);
        write_dict(dir.path(), DictionaryName::STCharacters, "干\t幹 乾\n", Backend::DoubleArray);
        write_dict(dir.path(), DictionaryName::TWVariants, "台\t臺\n", Backend::DoubleArray);
        let loader = DictionaryLoader::new(dir.path());
        let chain = loader
            .conversion_chain(Options::TRADITIONALIZE | Options::TW_STANDARD)
            .unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].len(), 2);
        assert_eq!(chain[0].max_key_length(), 2);
        assert_eq!(chain[1].len(), 1);
        assert_eq!(loader.cached_count(), 3);
    }

    #[test]
    fn load_spec_text_and_compiled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("seg.txt"), "美国\tx\n").unwrap();
        let loader = DictionaryLoader::new(dir.path());
        let spec = DictSpec {
            file: "seg.txt".into(),
            format: DictFormat::Text,
        };
        let d = loader.load_spec(&spec, dir.path()).unwrap();
        assert_eq!(d.len(), 1);
        let again = loader.load_spec(&spec, dir.path()).unwrap();
        assert!(Arc::ptr_eq(&d, &again));

        let compiled = DictSpec {
            file: "seg.txt".into(),
            format: DictFormat::Array,
        };
        let err = loader.load_spec(&compiled, dir.path()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }
}
