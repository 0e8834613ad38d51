// utils/validation.rs
use crate::utils::error::{AppError, Result};

/// Types de vocalisation acceptés par la recherche de cibles
pub const ALLOWED_CALL_TYPES: [&str; 2] = ["call", "song"];

/// Valider qu'une liste n'est pas vide
pub fn validate_non_empty_list<T>(items: &[T], field: &str) -> Result<()> {
    if items.is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Valider une liste de labels (au moins un, aucun vide)
pub fn validate_labels(labels: &[String]) -> Result<()> {
    validate_non_empty_list(labels, "labels")?;
    if labels.iter().any(|label| label.trim().is_empty()) {
        return Err(AppError::Validation("labels must not contain blank entries".to_string()));
    }
    Ok(())
}

/// Valider des codes espèces eBird (alphanumériques, non vides)
pub fn validate_species_codes(codes: &[String]) -> Result<()> {
    validate_non_empty_list(codes, "species_codes")?;
    let invalid: Vec<&str> = codes
        .iter()
        .map(String::as_str)
        .filter(|code| code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()))
        .collect();
    if !invalid.is_empty() {
        return Err(AppError::Validation(format!(
            "invalid species codes: {}",
            invalid.join(", ")
        )));
    }
    Ok(())
}

/// Retourne les types de vocalisation qui ne sont pas autorisés
pub fn invalid_call_types(call_types: &[String]) -> Vec<String> {
    call_types
        .iter()
        .filter(|t| !ALLOWED_CALL_TYPES.contains(&t.as_str()))
        .cloned()
        .collect()
}

/// Valider les types de vocalisation
pub fn validate_call_types(call_types: &[String]) -> Result<()> {
    validate_non_empty_list(call_types, "call_types")?;
    let invalid = invalid_call_types(call_types);
    if !invalid.is_empty() {
        return Err(AppError::Validation(format!(
            "invalid call types: {} (allowed: {})",
            invalid.join(", "),
            ALLOWED_CALL_TYPES.join(", ")
        )));
    }
    Ok(())
}

/// Valider un nombre strictement positif
pub fn validate_positive_number(value: i64, field: &str) -> Result<()> {
    if value <= 0 {
        return Err(AppError::Validation(format!("{} must be positive", field)));
    }
    Ok(())
}

/// Valider un chemin relatif vers le backend (pas de schéma, pas de remontée)
pub fn validate_relative_path(path: &str) -> Result<()> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("path must not be empty".to_string()));
    }
    if trimmed.contains("://") || trimmed.starts_with("//") || trimmed.contains('\\') {
        return Err(AppError::Validation("path must be relative to the backend".to_string()));
    }
    let route = trimmed.split('?').next().unwrap_or_default();
    if route.split('/').any(|segment| segment == "..") {
        return Err(AppError::Validation("path must not traverse upwards".to_string()));
    }
    Ok(())
}
