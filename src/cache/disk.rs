// Filesystem-backed key-value store.
// One JSON file per key under the platform cache directory, written atomically.

use std::path::PathBuf;

use async_trait::async_trait;
use directories::ProjectDirs;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::cache::store::KeyValueStore;
use crate::error::{GlossError, Result};

/// Persistent store rooted at a directory, one file per sanitized key.
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    /// Store under the platform cache directory (~/.cache/gloss on Linux).
    /// Returns None when the platform gives no home directory.
    pub fn new() -> Option<Self> {
        ProjectDirs::from("", "", "gloss").map(|dirs| Self {
            dir: dirs.cache_dir().to_path_buf(),
        })
    }

    /// Store under an explicit directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

/// Replace characters that are unsafe in file names.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

fn storage_err(e: std::io::Error) -> GlossError {
    GlossError::Storage(e.to_string())
}

#[async_trait]
impl KeyValueStore for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).await.map_err(storage_err)?;

        // Write atomically via temp file so readers never see a partial entry
        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(storage_err)?;
        file.write_all(value.as_bytes()).await.map_err(storage_err)?;
        file.sync_all().await.map_err(storage_err)?;
        fs::rename(&temp_path, &path).await.map_err(storage_err)?;

        Ok(())
    }
}
