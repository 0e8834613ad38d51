// infrastructure/storage/memory.rs
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::Duration;

use super::{portal_file_url, ObjectStore, ObjectUri};
use crate::utils::error::{AppError, Result};

/// Stockage volatil, trié par (bucket, clé)
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<(String, String), Vec<u8>>>,
    public_base_url: String,
}

impl MemoryObjectStore {
    pub fn new(public_base_url: &str) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            public_base_url: public_base_url.to_string(),
        }
    }

    fn key(uri: &ObjectUri) -> (String, String) {
        (uri.bucket.clone(), uri.path.clone())
    }

    fn poisoned<T>(_: T) -> AppError {
        AppError::StorageError("memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let objects = self.objects.read().map_err(Self::poisoned)?;
        Ok(objects
            .keys()
            .filter(|(b, key)| b == bucket && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .collect())
    }

    async fn read(&self, uri: &ObjectUri) -> Result<Vec<u8>> {
        let objects = self.objects.read().map_err(Self::poisoned)?;
        objects
            .get(&Self::key(uri))
            .cloned()
            .ok_or_else(|| AppError::NotFound(uri.to_string()))
    }

    async fn write(&self, uri: &ObjectUri, data: Vec<u8>) -> Result<()> {
        let mut objects = self.objects.write().map_err(Self::poisoned)?;
        objects.insert(Self::key(uri), data);
        Ok(())
    }

    async fn copy(&self, from: &ObjectUri, to: &ObjectUri) -> Result<()> {
        let mut objects = self.objects.write().map_err(Self::poisoned)?;
        let data = objects
            .get(&Self::key(from))
            .cloned()
            .ok_or_else(|| AppError::NotFound(from.to_string()))?;
        objects.insert(Self::key(to), data);
        Ok(())
    }

    async fn delete(&self, uri: &ObjectUri) -> Result<()> {
        let mut objects = self.objects.write().map_err(Self::poisoned)?;
        objects
            .remove(&Self::key(uri))
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(uri.to_string()))
    }

    async fn media_url(&self, uri: &ObjectUri, _ttl: Duration) -> Result<String> {
        Ok(portal_file_url(&self.public_base_url, uri))
    }
}
