// infrastructure/storage/s3.rs
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::time::Duration;
use tracing::debug;

use super::{ObjectStore, ObjectUri};
use crate::utils::config::Config;
use crate::utils::error::{AppError, Result};

/// Stockage S3 ; avec des clés HMAC, fonctionne contre `storage.googleapis.com`
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Créer le client S3 depuis la configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        let (access_key, secret_key) = match (&config.s3_access_key, &config.s3_secret_key) {
            (Some(access), Some(secret)) => (access.clone(), secret.clone()),
            _ => {
                return Err(AppError::Configuration(
                    "S3 credentials are missing".to_string(),
                ))
            }
        };
        let creds = Credentials::new(access_key, secret_key, None, None, "portal-static");

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(creds)
            .region(Region::new(config.s3_region.clone()))
            .endpoint_url(&config.s3_endpoint)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(true)
            .build();

        Ok(Self::new(S3Client::from_conf(s3_config)))
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_delimiter(delimiter.map(str::to_string))
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(storage_error)?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        debug!("Listed {} objects under s3://{}/{}", keys.len(), bucket, prefix);
        keys.sort();
        Ok(keys)
    }
}

fn storage_error(err: impl std::fmt::Display) -> AppError {
    AppError::StorageError(err.to_string())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        self.list_objects(bucket, prefix, None).await
    }

    /// Le délimiteur `/` laisse le serveur écarter les sous-dossiers
    async fn list_shallow(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        self.list_objects(bucket, prefix, Some("/")).await
    }

    async fn read(&self, uri: &ObjectUri) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&uri.bucket)
            .key(&uri.path)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    AppError::NotFound(uri.to_string())
                } else {
                    storage_error(service_error)
                }
            })?;

        let bytes = response.body.collect().await.map_err(storage_error)?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn write(&self, uri: &ObjectUri, data: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(&uri.bucket)
            .key(&uri.path)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn copy(&self, from: &ObjectUri, to: &ObjectUri) -> Result<()> {
        let source = format!("{}/{}", from.bucket, urlencoding::encode(&from.path));
        self.client
            .copy_object()
            .copy_source(source)
            .bucket(&to.bucket)
            .key(&to.path)
            .send()
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn delete(&self, uri: &ObjectUri) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&uri.bucket)
            .key(&uri.path)
            .send()
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn media_url(&self, uri: &ObjectUri, ttl: Duration) -> Result<String> {
        let presigning = PresigningConfig::expires_in(ttl).map_err(storage_error)?;
        let request = self
            .client
            .get_object()
            .bucket(&uri.bucket)
            .key(&uri.path)
            .presigned(presigning)
            .await
            .map_err(storage_error)?;
        Ok(request.uri().to_string())
    }
}
