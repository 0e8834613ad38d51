// api/routes/proxy.rs
use actix_web::http::StatusCode;
use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::core::session::ClientSession;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::validate_relative_path;
use crate::AppState;

/// Réponse unique du proxy GET quand le backend échoue
pub const FETCH_FAILED: &str = "Failed to fetch data";

#[derive(Debug, Deserialize)]
pub struct ProxyGetRequest {
    pub token: Option<String>,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct ProxyPostRequest {
    pub token: Option<String>,
    pub path: String,
    #[serde(default)]
    pub body: Value,
}

/// Token explicite, sinon celui de la session
fn pick_token<'a>(explicit: &'a Option<String>, session: &'a ClientSession) -> Option<&'a str> {
    explicit
        .as_deref()
        .filter(|t| !t.is_empty())
        .or(session.token.as_deref())
}

async fn fetch_json(state: &AppState, token: Option<&str>, path: &str) -> Result<Value> {
    let response = state.backend.raw_get(token, path).await?;
    if response.status() != reqwest::StatusCode::OK {
        return Err(AppError::Backend {
            status: response.status().as_u16(),
            message: FETCH_FAILED.to_string(),
        });
    }
    Ok(response.json().await?)
}

#[post("/proxy/get")]
pub async fn proxy_get(
    session: ClientSession,
    request: web::Json<ProxyGetRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    validate_relative_path(&request.path)?;
    let token = pick_token(&request.token, &session);

    match fetch_json(&state, token, &request.path).await {
        Ok(data) => Ok(HttpResponse::Ok().json(data)),
        Err(e) => {
            warn!("Proxy GET {} en échec: {}", request.path, e);
            Ok(HttpResponse::InternalServerError().json(json!({ "error": FETCH_FAILED })))
        }
    }
}

/// Relaie un POST au backend, statut et corps inchangés
#[post("/proxy/post")]
pub async fn proxy_post(
    session: ClientSession,
    request: web::Json<ProxyPostRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    validate_relative_path(&request.path)?;
    let token = pick_token(&request.token, &session);

    let response = state
        .backend
        .raw_post(token, &request.path, &request.body)
        .await?;
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_string();
    let bytes = response.bytes().await?;

    Ok(HttpResponse::build(status)
        .content_type(content_type)
        .body(bytes))
}
