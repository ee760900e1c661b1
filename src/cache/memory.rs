use async_trait::async_trait;
use dashmap::DashMap;
use presenter_core::Result;

use super::ManifestCache;

/// Process-local store for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryManifestCache {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ManifestCache for MemoryManifestCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|e| e.value().clone()))
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
