// src/lib.rs
// Modules principaux
pub mod api;
pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::core::{AnnotationService, AuthService, ClassifierService, CurationService};
use crate::infrastructure::{ObjectStore, ProjectRegistry};
use crate::services::BackendClient;
use crate::utils::{Config, Result};

// Version de l'application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Agile Modeling Portal";

/// État partagé par tous les workers actix
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendClient>,
    pub store: Arc<dyn ObjectStore>,
    pub auth: Arc<AuthService>,
    pub annotation: Arc<AnnotationService>,
    pub classifier: Arc<ClassifierService>,
    pub curation: Arc<CurationService>,
    pub cookie_secure: bool,
    pub run_mode: String,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn ObjectStore>, registry: ProjectRegistry) -> Result<Self> {
        let backend = Arc::new(BackendClient::new(
            &config.backend_url,
            config.backend_timeout(),
        )?);
        let registry = Arc::new(registry);

        Ok(Self {
            auth: Arc::new(AuthService::new(backend.clone())),
            annotation: Arc::new(AnnotationService::new(backend.clone())),
            classifier: Arc::new(ClassifierService::new(backend.clone())),
            curation: Arc::new(CurationService::new(store.clone(), registry)),
            backend,
            store,
            cookie_secure: config.cookie_secure,
            run_mode: config.run_mode.clone(),
        })
    }
}
