// infrastructure/storage/local.rs
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use walkdir::WalkDir;

use super::{ensure_safe_key, portal_file_url, ObjectStore, ObjectUri};
use crate::utils::error::{AppError, Result};

/// Stockage sur disque : `gs://bucket/clé` ↔ `<racine>/<bucket>/<clé>`
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl AsRef<Path>, public_base_url: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            public_base_url: public_base_url.to_string(),
        }
    }

    fn object_path(&self, uri: &ObjectUri) -> Result<PathBuf> {
        ensure_safe_key(&uri.bucket, &uri.path)?;
        Ok(self.root.join(&uri.bucket).join(&uri.path))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        ensure_safe_key(bucket, prefix)?;
        let bucket_root = self.root.join(bucket);
        // On ne parcourt que le dossier qui contient le préfixe
        let start = match prefix.rsplit_once('/') {
            Some((dir, _)) => bucket_root.join(dir),
            None => bucket_root.clone(),
        };
        let prefix = prefix.to_string();

        tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
            if !start.is_dir() {
                return Ok(Vec::new());
            }
            let mut keys = Vec::new();
            for entry in WalkDir::new(&start).follow_links(false) {
                let entry = entry.map_err(|e| AppError::StorageError(e.to_string()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = entry
                    .path()
                    .strip_prefix(&bucket_root)
                    .map_err(|e| AppError::StorageError(e.to_string()))?;
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(&prefix) {
                    keys.push(key);
                }
            }
            keys.sort();
            Ok(keys)
        })
        .await?
    }

    async fn read(&self, uri: &ObjectUri) -> Result<Vec<u8>> {
        let path = self.object_path(uri)?;
        fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(uri.to_string()),
            _ => AppError::StorageError(e.to_string()),
        })
    }

    async fn write(&self, uri: &ObjectUri, data: Vec<u8>) -> Result<()> {
        let path = self.object_path(uri)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;
        Ok(())
    }

    async fn copy(&self, from: &ObjectUri, to: &ObjectUri) -> Result<()> {
        let source = self.object_path(from)?;
        let target = self.object_path(to)?;
        if !fs::try_exists(&source).await? {
            return Err(AppError::NotFound(from.to_string()));
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&source, &target).await?;
        Ok(())
    }

    async fn delete(&self, uri: &ObjectUri) -> Result<()> {
        let path = self.object_path(uri)?;
        fs::remove_file(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(uri.to_string()),
            _ => AppError::StorageError(e.to_string()),
        })
    }

    async fn media_url(&self, uri: &ObjectUri, _ttl: Duration) -> Result<String> {
        ensure_safe_key(&uri.bucket, &uri.path)?;
        Ok(portal_file_url(&self.public_base_url, uri))
    }
}
