use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use bytes::Bytes;
use tracing::info;

use super::ObjectSink;

/// Writes objects as files below a root directory. Each `/`-separated key
/// segment becomes a directory level.
pub struct LocalDirSink {
    root: PathBuf,
}

impl LocalDirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves `key` below the root, refusing keys that would escape it.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for segment in key.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                bail!("object key '{key}' contains a relative path segment");
            }
            path.push(segment);
        }
        if path == self.root {
            bail!("object key '{key}' is empty");
        }
        Ok(path)
    }
}

#[async_trait::async_trait]
impl ObjectSink for LocalDirSink {
    #[tracing::instrument(skip(self, body))]
    async fn put(&self, key: &str, body: Bytes, _content_encoding: Option<&str>) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        info!(path = %path.display(), "Object written");
        Ok(())
    }
}
