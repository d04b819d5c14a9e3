use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;

use crate::foundation::error::{BenchError, BenchResult};

/// Key/blob persistence used for the recent-documents history. The medium is up to the
/// implementation.
pub trait HistoryStore {
    fn put(&mut self, key: &str, blob: Vec<u8>) -> BenchResult<()>;
    fn get(&self, key: &str) -> BenchResult<Option<Vec<u8>>>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryHistoryStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn put(&mut self, key: &str, blob: Vec<u8>) -> BenchResult<()> {
        self.blobs.insert(key.to_string(), blob);
        Ok(())
    }

    fn get(&self, key: &str) -> BenchResult<Option<Vec<u8>>> {
        Ok(self.blobs.get(key).cloned())
    }
}

/// One file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileHistoryStore {
    dir: PathBuf,
}

impl FileHistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> BenchResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(BenchError::history(format!("invalid history key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl HistoryStore for FileHistoryStore {
    fn put(&mut self, key: &str, blob: Vec<u8>) -> BenchResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create history dir '{}'", self.dir.display()))?;
        std::fs::write(&path, blob)
            .with_context(|| format!("write history '{}'", path.display()))?;
        Ok(())
    }

    fn get(&self, key: &str) -> BenchResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("read history '{}'", path.display()))
                .into()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/history/store.rs"]
mod tests;
