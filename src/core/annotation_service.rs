// core/annotation_service.rs
use std::sync::Arc;
use tracing::info;

use crate::core::session::ClientSession;
use crate::domain::{NextPossibleExample, Project};
use crate::services::backend::BackendClient;
use crate::utils::error::Result;
use crate::utils::validation::validate_labels;

/// Parcours d'annotation : un exemple candidat à la fois
pub struct AnnotationService {
    backend: Arc<BackendClient>,
}

impl AnnotationService {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    /// Projets accessibles à l'utilisateur
    pub async fn projects(&self, session: &ClientSession) -> Result<Vec<Project>> {
        self.backend.my_projects(session.bearer()?).await
    }

    /// Prochain exemple à annoter pour le projet courant
    pub async fn next_example(&self, session: &ClientSession) -> Result<NextPossibleExample> {
        let token = session.bearer()?;
        let project_id = session.project_id()?;
        self.backend.next_possible_example(token, project_id).await
    }

    /// Enregistre les labels puis passe à l'exemple suivant.
    /// Réannoter le même `embedding_id` est transmis tel quel au backend.
    pub async fn annotate_and_advance(
        &self,
        session: &ClientSession,
        embedding_id: i64,
        labels: &[String],
    ) -> Result<NextPossibleExample> {
        validate_labels(labels)?;
        let token = session.bearer()?;
        let project_id = session.project_id()?;

        self.backend
            .annotate_example(token, project_id, embedding_id, labels)
            .await?;
        info!(
            "✏️  Embedding {} annoté ({}) dans le projet {}",
            embedding_id,
            labels.join(", "),
            project_id
        );

        self.backend.next_possible_example(token, project_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageResponse;
    use crate::utils::error::AppError;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session() -> ClientSession {
        ClientSession::new(
            Some("tok".into()),
            Some(Project {
                id: 4,
                name: "caples".into(),
                description: None,
            }),
        )
    }

    fn service(server: &MockServer) -> AnnotationService {
        let backend = BackendClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        AnnotationService::new(Arc::new(backend))
    }

    async fn mount_exhausted(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/get_next_possible_example"))
            .and(query_param("project_id", "4"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "No more possible examples"})),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn next_example_requires_a_selected_project() {
        let server = MockServer::start().await;
        let session = ClientSession::new(Some("tok".into()), None);
        let err = service(&server).next_example(&session).await.unwrap_err();
        assert!(matches!(err, AppError::NoProjectSelected));
    }

    #[tokio::test]
    async fn exhausted_state_is_returned_as_a_message() {
        let server = MockServer::start().await;
        mount_exhausted(&server).await;

        let next = service(&server).next_example(&session()).await.unwrap();
        assert_eq!(
            next,
            NextPossibleExample::Exhausted(MessageResponse {
                message: "No more possible examples".into()
            })
        );
    }

    #[tokio::test]
    async fn annotating_posts_labels_then_fetches_next() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/annotate_example"))
            .and(query_param("embedding_id", "12"))
            .and(body_json(json!(["amro_song"])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .expect(2)
            .mount(&server)
            .await;
        mount_exhausted(&server).await;

        let service = service(&server);
        let labels = vec!["amro_song".to_string()];
        // Deux fois le même embedding : aucune erreur côté appelant
        for _ in 0..2 {
            let next = service
                .annotate_and_advance(&session(), 12, &labels)
                .await
                .unwrap();
            assert!(matches!(next, NextPossibleExample::Exhausted(_)));
        }
    }

    #[tokio::test]
    async fn empty_labels_are_rejected() {
        let server = MockServer::start().await;
        let err = service(&server)
            .annotate_and_advance(&session(), 12, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
