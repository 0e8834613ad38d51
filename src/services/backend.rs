// services/backend.rs
use crate::domain::{
    AnnotatedRecording, ClassifiedResult, ClassifierSearch, ClassifyRun, GatherRequest,
    MessageResponse, NextPossibleExample, Project, RecordingsSummary, Token, User,
};
use crate::utils::error::{AppError, Result};
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// Message de repli quand le backend refuse la connexion sans détail
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Client du backend agile modeling (JSON, authentification bearer)
#[derive(Clone)]
pub struct BackendClient {
    http_client: HttpClient,
    base_url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RunsReply {
    Runs(Vec<ClassifyRun>),
    Empty(MessageResponse),
}

#[derive(Serialize)]
struct LogitRangesBody<'a> {
    labels: &'a [String],
    logit_ranges: &'a [(f64, f64)],
}

#[derive(Serialize)]
struct GatherBody<'a> {
    species_codes: &'a [String],
    call_types: &'a [String],
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Transforme les statuts d'erreur du backend en `AppError`
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized);
        }
        let text = response.text().await.unwrap_or_default();
        let message = detail_of(&text).unwrap_or(text);
        Err(AppError::Backend {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!("GET {}", path);
        let response = self
            .http_client
            .get(self.url(path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T> {
        debug!("POST {}", path);
        let response = self
            .http_client
            .post(self.url(path))
            .bearer_auth(token)
            .query(query)
            .json(body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Échanger des identifiants contre un token (`POST /token`, formulaire)
    pub async fn login(&self, username: &str, password: &str) -> Result<Token> {
        let response = self
            .http_client
            .post(self.url("token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = detail_of(&text).unwrap_or_else(|| INVALID_CREDENTIALS.to_string());
            info!("Login refused by backend ({}) for {}", status, username);
            return Err(AppError::InvalidCredentials(detail));
        }

        Ok(response.json().await?)
    }

    pub async fn current_user(&self, token: &str) -> Result<User> {
        self.get_json(token, "users/me", &[]).await
    }

    pub async fn my_projects(&self, token: &str) -> Result<Vec<Project>> {
        self.get_json(token, "my_projects", &[]).await
    }

    pub async fn next_possible_example(
        &self,
        token: &str,
        project_id: i64,
    ) -> Result<NextPossibleExample> {
        self.post_json(
            token,
            "get_next_possible_example",
            &[("project_id", project_id.to_string())],
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn annotate_example(
        &self,
        token: &str,
        project_id: i64,
        embedding_id: i64,
        labels: &[String],
    ) -> Result<Value> {
        self.post_json(
            token,
            "annotate_example",
            &[
                ("project_id", project_id.to_string()),
                ("embedding_id", embedding_id.to_string()),
            ],
            labels,
        )
        .await
    }

    pub async fn label_summary(&self, token: &str, project_id: i64) -> Result<BTreeMap<String, u64>> {
        self.get_json(
            token,
            "get_label_summary",
            &[("project_id", project_id.to_string())],
        )
        .await
    }

    pub async fn annotations_by_label(
        &self,
        token: &str,
        project_id: i64,
        label: &str,
    ) -> Result<Vec<AnnotatedRecording>> {
        self.get_json(
            token,
            "get_annotations_by_label",
            &[
                ("project_id", project_id.to_string()),
                ("label", label.to_string()),
            ],
        )
        .await
    }

    pub async fn relabel_example(
        &self,
        token: &str,
        project_id: i64,
        embedding_id: i64,
        labels: &[String],
    ) -> Result<Value> {
        self.post_json(
            token,
            "relabel_example",
            &[
                ("project_id", project_id.to_string()),
                ("embedding_id", embedding_id.to_string()),
            ],
            labels,
        )
        .await
    }

    pub async fn summary(&self, token: &str, project_id: i64) -> Result<RecordingsSummary> {
        self.get_json(token, "get_summary", &[("project_id", project_id.to_string())])
            .await
    }

    /// Un `{"message": ...}` signifie qu'aucun classifieur n'a tourné
    pub async fn classifier_runs(&self, token: &str, project_id: i64) -> Result<Vec<ClassifyRun>> {
        let reply: RunsReply = self
            .get_json(
                token,
                "get_classifier_runs",
                &[("project_id", project_id.to_string())],
            )
            .await?;
        Ok(match reply {
            RunsReply::Runs(runs) => runs,
            RunsReply::Empty(_) => Vec::new(),
        })
    }

    pub async fn classify(&self, token: &str, project_id: i64) -> Result<MessageResponse> {
        self.post_json(
            token,
            "classify",
            &[("project_id", project_id.to_string())],
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn classifier_results(
        &self,
        token: &str,
        project_id: i64,
        classifier_run_id: i64,
    ) -> Result<Vec<ClassifiedResult>> {
        self.get_json(
            token,
            "get_classifier_results",
            &[
                ("project_id", project_id.to_string()),
                ("classifier_run_id", classifier_run_id.to_string()),
            ],
        )
        .await
    }

    pub async fn search_classified(
        &self,
        token: &str,
        project_id: i64,
        search: &ClassifierSearch,
    ) -> Result<Vec<ClassifiedResult>> {
        self.post_json(
            token,
            "search_classified",
            &[
                ("project_id", project_id.to_string()),
                ("classified_datetime", search.classified_datetime.clone()),
                ("max_logits", search.max_logits.to_string()),
                ("num_per_range", search.num_per_range.to_string()),
            ],
            &LogitRangesBody {
                labels: &search.labels,
                logit_ranges: &search.logit_ranges,
            },
        )
        .await
    }

    pub async fn gather_possible_examples(
        &self,
        token: &str,
        project_id: i64,
        request: &GatherRequest,
    ) -> Result<Value> {
        self.post_json(
            token,
            "gather_possible_examples",
            &[
                ("project_id", project_id.to_string()),
                (
                    "num_examples_per_target",
                    request.num_examples_per_target.to_string(),
                ),
                ("num_targets", request.num_targets.to_string()),
            ],
            &GatherBody {
                species_codes: &request.species_codes,
                call_types: &request.call_types,
            },
        )
        .await
    }

    /// GET brut : le statut n'est pas interprété (proxy et médias)
    pub async fn raw_get(&self, token: Option<&str>, path: &str) -> Result<Response> {
        let mut request = self.http_client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }

    /// GET d'un média servi par le backend (audio, spectrogramme), statut vérifié
    pub async fn media(&self, token: &str, path: &str) -> Result<Response> {
        debug!("GET média {}", path);
        let response = self
            .http_client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        Self::check(response).await
    }

    /// POST brut avec un corps JSON
    pub async fn raw_post(&self, token: Option<&str>, path: &str, body: &Value) -> Result<Response> {
        let mut request = self.http_client.post(self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }
}

/// Extrait `detail` d'un corps d'erreur FastAPI quand c'est une chaîne
fn detail_of(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("detail")?
        .as_str()
        .map(str::to_string)
}
