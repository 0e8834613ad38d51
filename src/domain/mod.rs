//! # Domain Models Module
//!
//! Ce module contient les modèles de données échangés avec le backend et
//! le stockage objet. Ce sont des DTOs de passage : le portail ne leur
//! impose aucun invariant au-delà de la présence des champs optionnels.
//!
//! ## Structure
//! - `user.rs`: Utilisateur, token et formulaire de connexion
//! - `project.rs`: Projets et emplacements de stockage
//! - `recording.rs`: Enregistrements, exemples candidats, classifieurs
//! - `example.rs`: Exemples du flux de curation (stockage objet)

pub mod example;
pub mod project;
pub mod recording;
pub mod user;

// Ré-export des types principaux pour une utilisation facile
pub use example::{
    CandidateName, ExampleClassCount, LabeledOutput, PrecomputedExample, SourceGlobCheck,
};
pub use project::{ExampleType, Project, ProjectLocations};
pub use recording::{
    AnnotatedRecording, ClassifiedResult, ClassifierSearch, ClassifyRun, EvalMetrics,
    GatherRequest, MessageResponse, NextPossibleExample, PossibleExample, RecordingsSummary,
};
pub use user::{LoginForm, Token, User};
