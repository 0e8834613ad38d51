// core/classifier_service.rs
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::core::session::ClientSession;
use crate::domain::{ClassifiedResult, ClassifierSearch, ClassifyRun, MessageResponse};
use crate::services::backend::BackendClient;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::validate_positive_number;

/// Nombre de résultats par label, éventuellement restreint aux labels
/// contenant `filter`
pub fn summarize_by_label(results: &[ClassifiedResult], filter: Option<&str>) -> BTreeMap<String, u64> {
    let filter = filter.map(str::trim).filter(|f| !f.is_empty());
    let mut counts = BTreeMap::new();
    for result in results {
        if filter.map_or(true, |f| result.label.contains(f)) {
            *counts.entry(result.label.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Résultats d'un seul label
pub fn filter_by_label(results: Vec<ClassifiedResult>, label: &str) -> Vec<ClassifiedResult> {
    results.into_iter().filter(|r| r.label == label).collect()
}

/// Vérifie les paramètres d'une recherche dans les sorties du classifieur
pub fn validate_search(search: &ClassifierSearch) -> Result<()> {
    if search.classified_datetime.trim().is_empty() {
        return Err(AppError::Validation(
            "classified_datetime is required".to_string(),
        ));
    }
    validate_positive_number(search.num_per_range, "num_per_range")?;
    if search.logit_ranges.is_empty() {
        return Err(AppError::Validation("logit_ranges must not be empty".to_string()));
    }
    if let Some((low, high)) = search
        .logit_ranges
        .iter()
        .find(|(low, high)| low.is_nan() || high.is_nan() || low > high)
    {
        return Err(AppError::Validation(format!(
            "invalid logit range [{}, {}]: low must not exceed high",
            low, high
        )));
    }
    Ok(())
}

/// Revue des exécutions du classifieur
pub struct ClassifierService {
    backend: Arc<BackendClient>,
}

impl ClassifierService {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    pub async fn runs(&self, session: &ClientSession) -> Result<Vec<ClassifyRun>> {
        self.backend
            .classifier_runs(session.bearer()?, session.project_id()?)
            .await
    }

    /// Lance le classifieur côté backend
    pub async fn run(&self, session: &ClientSession) -> Result<MessageResponse> {
        let project_id = session.project_id()?;
        let reply = self.backend.classify(session.bearer()?, project_id).await?;
        info!("🧠 Classifieur lancé pour le projet {}: {}", project_id, reply.message);
        Ok(reply)
    }

    pub async fn results(
        &self,
        session: &ClientSession,
        run_id: i64,
        label: Option<&str>,
    ) -> Result<Vec<ClassifiedResult>> {
        let results = self
            .backend
            .classifier_results(session.bearer()?, session.project_id()?, run_id)
            .await?;
        Ok(match label.filter(|l| !l.is_empty()) {
            Some(label) => filter_by_label(results, label),
            None => results,
        })
    }

    pub async fn summary(
        &self,
        session: &ClientSession,
        run_id: i64,
        filter: Option<&str>,
    ) -> Result<BTreeMap<String, u64>> {
        let results = self
            .backend
            .classifier_results(session.bearer()?, session.project_id()?, run_id)
            .await?;
        Ok(summarize_by_label(&results, filter))
    }

    pub async fn search(
        &self,
        session: &ClientSession,
        search: &ClassifierSearch,
    ) -> Result<Vec<ClassifiedResult>> {
        validate_search(search)?;
        self.backend
            .search_classified(session.bearer()?, session.project_id()?, search)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Project;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn result(id: i64, label: &str) -> ClassifiedResult {
        ClassifiedResult {
            id,
            embedding_id: id * 10,
            label: label.into(),
            logit: 1.0,
            timestamp_s: 0.0,
            filename: "site.wav".into(),
            project_id: Some(1),
            classifier_run_id: Some(2),
            image_path: "i.png".into(),
            audio_path: "a.wav".into(),
            annotated_labels: vec![],
        }
    }

    fn search(ranges: Vec<(f64, f64)>, num_per_range: i64) -> ClassifierSearch {
        ClassifierSearch {
            classified_datetime: "2024-06-01T10:00:00".into(),
            max_logits: true,
            num_per_range,
            labels: vec![],
            logit_ranges: ranges,
        }
    }

    #[test]
    fn summary_counts_per_label_with_optional_filter() {
        let results = vec![
            result(1, "amro_song"),
            result(2, "amro_call"),
            result(3, "amro_song"),
            result(4, "swathr_song"),
        ];
        let all = summarize_by_label(&results, None);
        assert_eq!(all.get("amro_song"), Some(&2));
        assert_eq!(all.len(), 3);

        let songs = summarize_by_label(&results, Some("song"));
        assert_eq!(songs.keys().collect::<Vec<_>>(), vec!["amro_song", "swathr_song"]);
        assert_eq!(summarize_by_label(&results, Some("  ")).len(), 3);
    }

    #[test]
    fn filter_keeps_exact_label_only() {
        let results = vec![result(1, "amro_song"), result(2, "amro_song_x")];
        let kept = filter_by_label(results, "amro_song");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 1);
    }

    #[test]
    fn search_ranges_must_be_ordered() {
        assert!(validate_search(&search(vec![(-1.0, 0.0), (0.0, 0.0)], 1)).is_ok());
        assert!(validate_search(&search(vec![(2.0, 1.0)], 4)).is_err());
        assert!(validate_search(&search(vec![(0.0, 1.0)], 0)).is_err());
        assert!(validate_search(&search(vec![], 4)).is_err());
        assert!(validate_search(&search(vec![(f64::NAN, 1.0)], 4)).is_err());
    }

    #[tokio::test]
    async fn results_can_be_narrowed_to_one_label() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_classifier_results"))
            .and(query_param("classifier_run_id", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                result(1, "amro_song"),
                result(2, "swathr_song")
            ])))
            .mount(&server)
            .await;

        let backend = BackendClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let service = ClassifierService::new(Arc::new(backend));
        let session = ClientSession::new(
            Some("tok".into()),
            Some(Project {
                id: 1,
                name: "caples".into(),
                description: None,
            }),
        );

        let narrowed = service.results(&session, 2, Some("swathr_song")).await.unwrap();
        assert_eq!(narrowed.len(), 1);
        let all = service.results(&session, 2, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
