//! # Stockage objet
//!
//! Les enregistrements, spectrogrammes et journaux de labels vivent dans un
//! stockage objet adressé par des URI `gs://bucket/chemin`. Le portail n'y
//! accède qu'à travers le trait [`ObjectStore`] ; trois adaptateurs existent :
//! - `local` : arborescence de fichiers (`<racine>/<bucket>/<clé>`)
//! - `memory` : stockage volatil, utilisé en test et en démonstration
//! - `s3` : API S3, compatible avec l'endpoint d'interopérabilité GCS

pub mod local;
pub mod memory;
pub mod s3;

use async_trait::async_trait;
use globset::GlobBuilder;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::utils::config::{Config, StorageType};
use crate::utils::error::{AppError, Result};

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

/// Caractères qui ouvrent un motif glob
const GLOB_META: [char; 4] = ['*', '?', '[', '{'];

/// Adresse d'un objet : bucket + chemin
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUri {
    pub bucket: String,
    pub path: String,
}

impl ObjectUri {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
        }
    }

    /// Analyse `gs://bucket/chemin` (le préfixe `s3://` est aussi accepté)
    pub fn parse(url: &str) -> Result<Self> {
        let stripped = url
            .trim()
            .trim_start_matches("gs://")
            .trim_start_matches("s3://");
        let (bucket, path) = stripped
            .split_once('/')
            .ok_or_else(|| AppError::InvalidStorageUri(url.to_string()))?;
        let path = path.trim_end_matches('/');
        if bucket.is_empty() || path.is_empty() {
            return Err(AppError::InvalidStorageUri(url.to_string()));
        }
        Ok(Self::new(bucket, path))
    }

    /// Ajoute un segment au chemin
    pub fn join(&self, segment: &str) -> Self {
        Self::new(
            self.bucket.clone(),
            format!("{}/{}", self.path, segment.trim_start_matches('/')),
        )
    }

    /// Dernier segment du chemin
    pub fn basename(&self) -> &str {
        basename(&self.path)
    }
}

impl fmt::Display for ObjectUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.path)
    }
}

impl FromStr for ObjectUri {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Dernier segment d'une clé
pub fn basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Nom du dossier parent direct d'une clé
pub fn parent_folder(key: &str) -> Option<&str> {
    let (parent, _) = key.rsplit_once('/')?;
    Some(basename(parent))
}

/// Opérations de stockage dont le portail a besoin
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Liste récursivement les clés commençant par `prefix`, en ordre lexicographique
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// Comme `list`, sans descendre dans les sous-dossiers après `prefix`
    async fn list_shallow(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let keys = self.list(bucket, prefix).await?;
        Ok(keys
            .into_iter()
            .filter(|key| !key.strip_prefix(prefix).unwrap_or(key).contains('/'))
            .collect())
    }

    /// Lit un objet ; `AppError::NotFound` s'il n'existe pas
    async fn read(&self, uri: &ObjectUri) -> Result<Vec<u8>>;

    /// Écrit (ou remplace) un objet
    async fn write(&self, uri: &ObjectUri, data: Vec<u8>) -> Result<()>;

    async fn copy(&self, from: &ObjectUri, to: &ObjectUri) -> Result<()>;

    async fn delete(&self, uri: &ObjectUri) -> Result<()>;

    /// URL consultable par le navigateur, valable `ttl`
    async fn media_url(&self, uri: &ObjectUri, ttl: Duration) -> Result<String>;

    /// Déplacement = copie puis suppression (pas d'atomicité)
    async fn rename(&self, from: &ObjectUri, to: &ObjectUri) -> Result<()> {
        self.copy(from, to).await?;
        self.delete(from).await
    }
}

/// Liste les clés d'un bucket qui correspondent à un motif glob.
///
/// `*` ne traverse pas les `/`, comme le `matchGlob` de GCS.
pub async fn list_glob(store: &dyn ObjectStore, bucket: &str, pattern: &str) -> Result<Vec<String>> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher();
    let prefix = match pattern.find(GLOB_META) {
        Some(index) => &pattern[..index],
        None => pattern,
    };

    let rest = &pattern[prefix.len()..];
    let keys = if rest.contains('/') || rest.contains("**") {
        store.list(bucket, prefix).await?
    } else {
        store.list_shallow(bucket, prefix).await?
    };
    Ok(keys.into_iter().filter(|key| matcher.is_match(key)).collect())
}

/// Construit l'adaptateur demandé par la configuration
pub async fn build_store(config: &Config) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.storage_type {
        StorageType::Local => Arc::new(LocalObjectStore::new(
            &config.storage_root,
            &config.public_base_url,
        )),
        StorageType::Memory => Arc::new(MemoryObjectStore::new(&config.public_base_url)),
        StorageType::S3 => Arc::new(S3ObjectStore::from_config(config).await?),
    };
    info!("✅ Stockage objet initialisé ({:?})", config.storage_type);
    Ok(store)
}

/// URL servie par la route `/files` du portail
pub(crate) fn portal_file_url(public_base_url: &str, uri: &ObjectUri) -> String {
    let key: Vec<String> = uri
        .path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!(
        "{}/files/{}/{}",
        public_base_url.trim_end_matches('/'),
        urlencoding::encode(&uri.bucket),
        key.join("/")
    )
}

/// Rejette les segments qui sortiraient de la racine de stockage
pub(crate) fn ensure_safe_key(bucket: &str, key: &str) -> Result<()> {
    let unsafe_segment = |s: &str| s == ".." || s == "." || s.contains('\\');
    if bucket.is_empty() || bucket.contains('/') || unsafe_segment(bucket) {
        return Err(AppError::Validation(format!("invalid bucket name: {}", bucket)));
    }
    if key.starts_with('/') || key.split('/').any(unsafe_segment) {
        return Err(AppError::Validation(format!("invalid object key: {}", key)));
    }
    Ok(())
}

/// Type MIME déduit de l'extension
pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "wav" => "audio/wav",
        Some(ext) if ext == "mp3" => "audio/mpeg",
        Some(ext) if ext == "flac" => "audio/flac",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "txt" => "text/plain; charset=utf-8",
        Some(ext) if ext == "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bucket_and_path() {
        let uri = ObjectUri::parse("gs://caples/search_results/run1").unwrap();
        assert_eq!(uri.bucket, "caples");
        assert_eq!(uri.path, "search_results/run1");
        assert_eq!(uri.to_string(), "gs://caples/search_results/run1");
        assert_eq!(uri.join("a.wav").path, "search_results/run1/a.wav");
        assert_eq!(uri.basename(), "run1");
    }

    #[test]
    fn rejects_uris_without_bucket_or_path() {
        assert!(matches!(ObjectUri::parse("gs://caples"), Err(AppError::InvalidStorageUri(_))));
        assert!(matches!(ObjectUri::parse("gs:///path"), Err(AppError::InvalidStorageUri(_))));
        assert!(matches!(ObjectUri::parse("gs://caples/"), Err(AppError::InvalidStorageUri(_))));
    }

    #[test]
    fn parent_folder_is_the_direct_parent() {
        assert_eq!(parent_folder("labeled/amro_song/x.wav"), Some("amro_song"));
        assert_eq!(parent_folder("x.wav"), None);
    }

    #[test]
    fn unsafe_keys_are_rejected() {
        assert!(ensure_safe_key("bucket", "a/b.wav").is_ok());
        assert!(ensure_safe_key("bucket", "a/../../etc").is_err());
        assert!(ensure_safe_key("..", "a").is_err());
        assert!(ensure_safe_key("bucket", "/abs").is_err());
    }

    #[test]
    fn file_urls_encode_each_segment() {
        let uri = ObjectUri::new("caples", "search/a^_^5^_^amro.wav");
        assert_eq!(
            portal_file_url("http://localhost:8080/", &uri),
            "http://localhost:8080/files/caples/search/a%5E_%5E5%5E_%5Eamro.wav"
        );
    }

    #[tokio::test]
    async fn glob_listing_does_not_cross_folders() {
        let store = MemoryObjectStore::new("http://portal");
        for key in ["dir/a.wav", "dir/a.png", "dir/sub/b.wav", "other/c.wav"] {
            store
                .write(&ObjectUri::new("bkt", key), b"x".to_vec())
                .await
                .unwrap();
        }

        let direct = list_glob(&store, "bkt", "dir/*").await.unwrap();
        assert_eq!(direct, vec!["dir/a.png".to_string(), "dir/a.wav".to_string()]);

        let nested = list_glob(&store, "bkt", "dir/*/*").await.unwrap();
        assert_eq!(nested, vec!["dir/sub/b.wav".to_string()]);

        let wavs = list_glob(&store, "bkt", "dir/*.wav").await.unwrap();
        assert_eq!(wavs, vec!["dir/a.wav".to_string()]);
    }

    /// Enregistre les listages demandés au stockage sous-jacent
    struct RecordingStore {
        inner: MemoryObjectStore,
        calls: std::sync::Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
            self.calls.lock().unwrap().push("deep");
            self.inner.list(bucket, prefix).await
        }
        async fn list_shallow(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
            self.calls.lock().unwrap().push("shallow");
            let keys = self.inner.list(bucket, prefix).await?;
            Ok(keys
                .into_iter()
                .filter(|key| !key.strip_prefix(prefix).unwrap_or(key).contains('/'))
                .collect())
        }
        async fn read(&self, uri: &ObjectUri) -> Result<Vec<u8>> {
            self.inner.read(uri).await
        }
        async fn write(&self, uri: &ObjectUri, data: Vec<u8>) -> Result<()> {
            self.inner.write(uri, data).await
        }
        async fn copy(&self, from: &ObjectUri, to: &ObjectUri) -> Result<()> {
            self.inner.copy(from, to).await
        }
        async fn delete(&self, uri: &ObjectUri) -> Result<()> {
            self.inner.delete(uri).await
        }
        async fn media_url(&self, uri: &ObjectUri, ttl: Duration) -> Result<String> {
            self.inner.media_url(uri, ttl).await
        }
    }

    #[tokio::test]
    async fn single_level_patterns_list_shallowly() {
        let store = RecordingStore {
            inner: MemoryObjectStore::new("http://portal"),
            calls: std::sync::Mutex::new(Vec::new()),
        };
        for key in ["dir/a.wav", "dir/sub/b.wav", "dir/sub/deep/c.wav"] {
            store
                .write(&ObjectUri::new("bkt", key), b"x".to_vec())
                .await
                .unwrap();
        }

        let direct = list_glob(&store, "bkt", "dir/*.wav").await.unwrap();
        assert_eq!(direct, vec!["dir/a.wav".to_string()]);
        let nested = list_glob(&store, "bkt", "dir/*/*.wav").await.unwrap();
        assert_eq!(nested, vec!["dir/sub/b.wav".to_string()]);
        let all = list_glob(&store, "bkt", "dir/**").await.unwrap();
        assert_eq!(all.len(), 3);

        assert_eq!(*store.calls.lock().unwrap(), vec!["shallow", "deep", "deep"]);
    }

    #[tokio::test]
    async fn default_shallow_listing_drops_nested_keys() {
        let store = MemoryObjectStore::new("http://portal");
        for key in ["dir/a.wav", "dir/ab.png", "dir/sub/b.wav"] {
            store
                .write(&ObjectUri::new("bkt", key), b"x".to_vec())
                .await
                .unwrap();
        }
        let keys = store.list_shallow("bkt", "dir/a").await.unwrap();
        assert_eq!(keys, vec!["dir/a.wav".to_string(), "dir/ab.png".to_string()]);
    }
}
