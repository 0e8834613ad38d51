//! Registre des projets et des utilisateurs.
//!
//! Fichier JSON chargé au démarrage :
//!
//! ```json
//! {
//!   "projects": { "caples": { "searchResults": "gs://b/search", "alreadyLabeledFile": "gs://b/labeled.txt" } },
//!   "users": { "ana@example.org": { "defaultProject": "caples" } }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::domain::{ExampleType, ProjectLocations};
use crate::infrastructure::storage::ObjectUri;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    pub default_project: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectRegistry {
    #[serde(default)]
    projects: HashMap<String, ProjectLocations>,
    #[serde(default)]
    users: HashMap<String, UserEntry>,
}

impl ProjectRegistry {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Charger le registre ; un fichier absent donne un registre vide
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => {
                let registry = Self::from_json(&raw)?;
                info!(
                    "📒 Registre chargé: {} projets, {} utilisateurs",
                    registry.projects.len(),
                    registry.users.len()
                );
                Ok(registry)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Registre des projets introuvable ({}), registre vide", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn with_project(mut self, name: &str, locations: ProjectLocations) -> Self {
        self.projects.insert(name.to_string(), locations);
        self
    }

    pub fn with_user(mut self, email: &str, default_project: &str) -> Self {
        self.users.insert(
            email.to_string(),
            UserEntry {
                default_project: default_project.to_string(),
            },
        );
        self
    }

    pub fn project(&self, name: &str) -> Result<&ProjectLocations> {
        self.projects
            .get(name)
            .ok_or_else(|| AppError::ProjectNotFound(name.to_string()))
    }

    /// Emplacement d'un type d'exemples pour un projet
    pub fn examples_location(&self, project: &str, example_type: ExampleType) -> Result<ObjectUri> {
        let location = self
            .project(project)?
            .for_type(example_type)
            .filter(|path| !path.is_empty())
            .ok_or_else(|| AppError::MissingProjectPath {
                project: project.to_string(),
                field: example_type.field_name(),
            })?;
        ObjectUri::parse(location)
    }

    /// Journal des exemples déjà labellisés
    pub fn already_labeled_file(&self, project: &str) -> Result<ObjectUri> {
        let location = self
            .project(project)?
            .already_labeled_file
            .as_deref()
            .filter(|path| !path.is_empty())
            .ok_or_else(|| AppError::MissingProjectPath {
                project: project.to_string(),
                field: "alreadyLabeledFile",
            })?;
        ObjectUri::parse(location)
    }

    pub fn default_project(&self, email: &str) -> Result<String> {
        self.users
            .get(email)
            .map(|user| user.default_project.clone())
            .ok_or_else(|| AppError::UserNotFound(email.to_string()))
    }
}
