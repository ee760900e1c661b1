//! Filesystem object store.
//!
//! One file per key. The file name is the SHA-256 of the key, fanned out over
//! two directory levels (`ab/cd/abcd...json`). Writes go to a temp file in the
//! target directory followed by a rename, so readers see either the old entry
//! or the new one.

use async_trait::async_trait;
use presenter_core::{Error, Result};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::ManifestCache;

#[derive(Debug, Clone)]
pub struct FsManifestCache {
    root: PathBuf,
}

impl FsManifestCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        self.root
            .join(&digest[0..2])
            .join(&digest[2..4])
            .join(format!("{}.json", digest))
    }
}

#[async_trait]
impl ManifestCache for FsManifestCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::CacheUnavailable(format!("read {:?}: {}", path, e))),
        }
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        let dir = path
            .parent()
            .ok_or_else(|| Error::Internal(format!("cache path has no parent: {:?}", path)))?;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::CacheUnavailable(format!("create {:?}: {}", dir, e)))?;

        let tmp = dir.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::CacheUnavailable(format!("write {:?}: {}", tmp, e)));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::CacheUnavailable(format!("rename to {:?}: {}", path, e)));
        }

        debug!(key = %key, path = ?path, bytes = bytes.len(), "Cached manifest");
        Ok(())
    }
}
