//! Exemples stockés dans le stockage objet (flux de curation).
//!
//! Conventions de nommage :
//! - exemple précalculé : `<fichier>^_^<timestamp_s>^_^<espèce>.{wav,png}`
//! - sortie labellisée : `<fichier>___<timestamp_s>.wav` rangée dans `<classe>/`

use serde::{Deserialize, Serialize};

/// Séparateur des champs dans le nom d'un exemple précalculé
pub const NAME_SEPARATOR: &str = "^_^";

/// Séparateur fichier/timestamp des sorties labellisées
pub const LABELED_SEPARATOR: &str = "___";

/// Ancien séparateur encore présent dans certains buckets
const LEGACY_LABELED_SEPARATOR: &str = "__";

/// Champs encodés dans le nom de base d'un exemple précalculé
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateName {
    pub filename: String,
    pub timestamp_s: String,
    pub species: String,
}

impl CandidateName {
    /// Découpe un nom de base sans extension ; les champs absents restent vides
    pub fn parse(basename: &str) -> Self {
        let mut parts = basename.splitn(3, NAME_SEPARATOR);
        let filename = parts.next().unwrap_or_default().to_string();
        let timestamp_s = parts.next().unwrap_or_default().to_string();
        let species = parts.next().unwrap_or_default().to_string();
        Self {
            filename,
            timestamp_s,
            species,
        }
    }

    /// Espèce d'un nom de fichier qui porte encore son extension
    pub fn species_of_file(file_name: &str) -> String {
        Self::parse(file_name)
            .species
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

/// Exemple précalculé prêt à être annoté
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecomputedExample {
    /// URI `gs://` du fichier audio
    pub gsuri: String,
    pub audio_url: String,
    pub spec_url: String,
    pub filename: String,
    pub species: String,
    #[serde(alias = "timestampS")]
    pub timestamp_s: String,
}

/// Nombre d'exemples par classe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleClassCount {
    pub class: String,
    pub number: u64,
}

/// Sortie déjà labellisée, rangée dans le dossier de sa classe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledOutput {
    pub example_class: String,
    pub filename: String,
    #[serde(alias = "timestampS")]
    pub timestamp_s: String,
    pub gsuri: String,
    pub audio_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_url: Option<String>,
}

/// Découpe `<fichier>___<timestamp>.wav` en (fichier, timestamp sans extension)
pub fn split_labeled_name(basename: &str) -> (String, String) {
    let split = basename
        .split_once(LABELED_SEPARATOR)
        .or_else(|| basename.split_once(LEGACY_LABELED_SEPARATOR));
    match split {
        Some((filename, rest)) => (
            filename.to_string(),
            rest.split('.').next().unwrap_or_default().to_string(),
        ),
        None => (basename.to_string(), String::new()),
    }
}

/// Résultat de la vérification d'un motif de sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceGlobCheck {
    pub success: bool,
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
