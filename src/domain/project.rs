use serde::{Deserialize, Serialize};
use std::fmt;

/// Projet (espace de travail) tel que listé par `my_projects`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Emplacements de stockage d'un projet, tels que décrits dans le registre
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLocations {
    /// Dossier des exemples précalculés (paires .wav/.png)
    #[serde(default)]
    pub search_results: Option<String>,
    /// Dossier de dossiers des enregistrements cibles
    #[serde(default)]
    pub target_recordings: Option<String>,
    /// Dossier de dossiers des sorties labellisées
    #[serde(default)]
    pub labeled_outputs: Option<String>,
    /// Journal texte des exemples déjà labellisés
    #[serde(default)]
    pub already_labeled_file: Option<String>,
}

impl ProjectLocations {
    /// Emplacement correspondant à un type d'exemples
    pub fn for_type(&self, example_type: ExampleType) -> Option<&str> {
        match example_type {
            ExampleType::SearchResults => self.search_results.as_deref(),
            ExampleType::TargetRecordings => self.target_recordings.as_deref(),
            ExampleType::LabeledOutputs => self.labeled_outputs.as_deref(),
        }
    }
}

/// Familles d'exemples stockées pour un projet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExampleType {
    SearchResults,
    TargetRecordings,
    LabeledOutputs,
}

impl ExampleType {
    /// Nom du champ dans le registre
    pub fn field_name(&self) -> &'static str {
        match self {
            ExampleType::SearchResults => "searchResults",
            ExampleType::TargetRecordings => "targetRecordings",
            ExampleType::LabeledOutputs => "labeledOutputs",
        }
    }

    /// Les cibles et sorties labellisées sont rangées en dossiers de dossiers
    pub fn is_nested(&self) -> bool {
        !matches!(self, ExampleType::SearchResults)
    }
}

impl fmt::Display for ExampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}
