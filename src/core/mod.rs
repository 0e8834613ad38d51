// core/mod.rs
pub mod annotation_service;
pub mod auth_service;
pub mod classifier_service;
pub mod curation_service;
pub mod session;

// Ré-exports pour faciliter l'import
pub use annotation_service::AnnotationService;
pub use auth_service::{AuthService, Gate, TokenChange, View};
pub use classifier_service::ClassifierService;
pub use curation_service::CurationService;
pub use session::ClientSession;
