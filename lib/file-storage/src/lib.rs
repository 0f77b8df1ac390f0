use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use agora_store::Storage;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed storage file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable storage kept in a single JSON object (`{"key": "value", ...}`) on disk.
///
/// Nothing is cached: every `get` reads the file and every `set` rewrites it whole,
/// through a temporary file that is renamed over the original.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Fails if the file exists but is not a valid storage document.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let storage = FileStorage { path: path.into() };
        let entries = storage.read_entries()?;
        debug!("Opened {} with {} entries", storage.path.display(), entries.len());
        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => return Err(Error::Io { path: self.path.clone(), source }),
        };
        serde_json::from_str(&raw).map_err(|source| Error::Json { path: self.path.clone(), source })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        let serialized = serde_json::to_string_pretty(entries)
            .map_err(|source| Error::Json { path: self.path.clone(), source })?;

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, serialized).map_err(io_error(&tmp_path))?;
        fs::rename(&tmp_path, &self.path).map_err(io_error(&self.path))?;
        Ok(())
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> Error {
    let path = path.to_owned();
    move |source| Error::Io { path, source }
}

impl Storage for FileStorage {
    type Error = Error;

    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.write_entries(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("agora.json")).unwrap();
        assert_eq!(storage.get("users").unwrap(), None);
        assert!(!storage.path().exists());
    }

    #[test]
    fn values_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("agora.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set("rooms", "[]").unwrap();
        storage.set("userLogged", "null").unwrap();
        storage.set("rooms", "[{\"id\":\"1\"}]").unwrap();

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("rooms").unwrap().as_deref(), Some("[{\"id\":\"1\"}]"));
        assert_eq!(reopened.get("userLogged").unwrap().as_deref(), Some("null"));
        assert!(!path.with_file_name("agora.json.tmp").exists());
    }

    #[test]
    fn malformed_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agora.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(FileStorage::open(&path), Err(Error::Json { .. })));
    }
}
