use std::path::PathBuf;

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;

/// Byte sink for uploaded images. `exists` reports whether the storage
/// area has been provisioned; the service never creates it on demand.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn exists(&self) -> bool;
    async fn store(&self, name: &str, bytes: Bytes) -> anyhow::Result<()>;
}

/// Writes uploads into a preconfigured local directory.
#[derive(Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStorage for FileSystemStorage {
    async fn exists(&self) -> bool {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) => meta.is_dir(),
            Err(_) => false,
        }
    }

    async fn store(&self, name: &str, bytes: Bytes) -> anyhow::Result<()> {
        let target = self.root.join(name);
        tokio::fs::write(&target, &bytes)
            .await
            .with_context(|| format!("write {}", target.display()))?;
        Ok(())
    }
}
