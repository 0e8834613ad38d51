//! DTOs miroirs du contrat publié par le backend.
//!
//! Aucun invariant n'est vérifié ici au-delà de la présence des champs
//! optionnels ; le backend reste la source de vérité.

use serde::{Deserialize, Serialize};

/// Segment d'enregistrement déjà annoté
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRecording {
    pub filename: String,
    pub timestamp_s: f64,
    /// Un enregistrement peut contenir plusieurs espèces
    pub species_labels: Vec<String>,
    pub embedding_id: i64,
    pub image_path: String,
    pub audio_path: String,
}

/// Exemple candidat en attente d'annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PossibleExample {
    pub embedding_id: i64,
    pub filename: String,
    pub timestamp_s: f64,
    pub score: f64,
    pub image_path: String,
    pub audio_path: String,
    pub target_species: String,
    pub target_call_type: String,
}

impl PossibleExample {
    /// Label suggéré à l'annotateur (`espèce_type`)
    pub fn suggested_label(&self) -> String {
        format!("{}_{}", self.target_species, self.target_call_type)
    }
}

/// Réponse de `get_next_possible_example` : un exemple, ou un message
/// quand il n'en reste plus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NextPossibleExample {
    Example(PossibleExample),
    Exhausted(MessageResponse),
}

/// Métriques d'évaluation d'un classifieur
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    #[serde(default)]
    pub top1_acc: Option<f64>,
    #[serde(default)]
    pub roc_auc: Option<f64>,
    #[serde(default)]
    pub cmap: Option<f64>,
}

/// Exécution d'un classifieur
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyRun {
    pub id: i64,
    pub datetime: String,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub eval_metrics: EvalMetrics,
}

/// Résultat de classification d'une fenêtre d'enregistrement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedResult {
    pub id: i64,
    pub embedding_id: i64,
    pub label: String,
    pub logit: f64,
    pub timestamp_s: f64,
    pub filename: String,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub classifier_run_id: Option<i64>,
    pub image_path: String,
    pub audio_path: String,
    #[serde(default)]
    pub annotated_labels: Vec<String>,
}

/// Statistiques globales d'un projet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingsSummary {
    pub num_finished_possible_examples: u64,
    pub num_labels: u64,
    pub num_embeddings: u64,
    pub num_source_files: u64,
    pub hours_recordings: f64,
}

/// Réponse `{"message": ...}` renvoyée par les actions du backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Paramètres de recherche dans les sorties d'un classifieur
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSearch {
    pub classified_datetime: String,
    #[serde(default = "default_true")]
    pub max_logits: bool,
    #[serde(default = "default_num_per_range")]
    pub num_per_range: i64,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Intervalles de logits `[bas, haut]`
    pub logit_ranges: Vec<(f64, f64)>,
}

fn default_true() -> bool {
    true
}

fn default_num_per_range() -> i64 {
    4
}

/// Demande de collecte d'exemples candidats autour d'espèces cibles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatherRequest {
    pub species_codes: Vec<String>,
    pub call_types: Vec<String>,
    pub num_targets: i64,
    pub num_examples_per_target: i64,
}
