// utils/mod.rs
pub mod config;
pub mod error;
pub mod validation;

// Ré-exports pour faciliter l'import
pub use config::{Config, StorageType};
pub use error::{AppError, Result};
pub use validation::{
    invalid_call_types, validate_call_types, validate_labels, validate_non_empty_list,
    validate_positive_number, validate_relative_path, validate_species_codes,
};
