// utils/config.rs
use crate::utils::error::{AppError, Result};
use dotenv::dotenv;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Adaptateur de stockage objet sélectionné par `STORAGE_TYPE`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Local,
    S3,
    Memory,
}

impl FromStr for StorageType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(StorageType::Local),
            "s3" | "gcs" => Ok(StorageType::S3),
            "memory" => Ok(StorageType::Memory),
            other => Err(AppError::Configuration(format!(
                "STORAGE_TYPE must be one of local, s3, memory (got {})",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Environnement et serveur
    pub run_mode: String,
    pub server_host: String,
    pub server_port: u16,
    pub workers: usize,
    pub log_level: String,
    pub logging_format: String,

    // Backend agile modeling
    pub backend_url: String,
    pub backend_timeout_seconds: u64,

    // URL publique du portail (URLs média du stockage local)
    pub public_base_url: String,

    // Stockage objet
    pub storage_type: StorageType,
    pub storage_root: PathBuf,
    pub s3_endpoint: String,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
    pub s3_region: String,

    // Registre des projets
    pub projects_file: PathBuf,

    // Cookies de session
    pub cookie_secure: bool,
}

impl Config {
    /// Charger la configuration depuis les variables d'environnement
    pub fn from_env() -> Result<Self> {
        // Charger le fichier .env si présent
        let _ = dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construit la configuration à partir d'une source de variables quelconque
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Config {
            run_mode: var("RUN_MODE", "development"),
            server_host: var("SERVER_HOST", "0.0.0.0"),
            server_port: parse_var(&lookup, "SERVER_PORT", "8080")?,
            workers: parse_var(&lookup, "WORKERS", "4")?,
            log_level: var("LOG_LEVEL", "info"),
            logging_format: var("LOGGING_FORMAT", "json"),

            backend_url: var("SERVER_URL", "http://localhost:8000"),
            backend_timeout_seconds: parse_var(&lookup, "BACKEND_TIMEOUT_SECONDS", "30")?,

            public_base_url: var("PUBLIC_BASE_URL", "http://localhost:8080"),

            storage_type: var("STORAGE_TYPE", "local").parse()?,
            storage_root: PathBuf::from(var("STORAGE_ROOT", "./storage")),
            s3_endpoint: var("S3_ENDPOINT", "https://storage.googleapis.com"),
            s3_access_key: lookup("S3_ACCESS_KEY"),
            s3_secret_key: lookup("S3_SECRET_KEY"),
            s3_region: var("S3_REGION", "auto"),

            projects_file: PathBuf::from(var("PROJECTS_FILE", "./config/projects.json")),

            cookie_secure: parse_var(&lookup, "COOKIE_SECURE", "false")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(AppError::Configuration("SERVER_PORT must be non-zero".to_string()));
        }
        if self.workers == 0 {
            return Err(AppError::Configuration("WORKERS must be at least 1".to_string()));
        }
        if self.storage_type == StorageType::S3
            && (self.s3_access_key.is_none() || self.s3_secret_key.is_none())
        {
            return Err(AppError::Configuration(
                "S3_ACCESS_KEY and S3_SECRET_KEY are required when STORAGE_TYPE=s3".to_string(),
            ));
        }
        Ok(())
    }

    /// Timeout appliqué aux appels vers le backend
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_seconds)
    }

    /// Vérifier si on est en production
    pub fn is_production(&self) -> bool {
        self.run_mode == "production"
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse()
        .map_err(|_| AppError::Configuration(format!("{} has an invalid value", key)))
}
