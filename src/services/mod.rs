// services/mod.rs
pub mod backend;

// Ré-exports pour faciliter l'import
pub use backend::BackendClient;
