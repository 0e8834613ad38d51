// api/routes/media.rs
use actix_web::{get, web, HttpRequest, HttpResponse};
use tracing::debug;

use crate::core::session::ClientSession;
use crate::infrastructure::storage::{content_type_for, ObjectUri};
use crate::utils::error::Result;
use crate::utils::validation::validate_relative_path;
use crate::AppState;

/// Audio et spectrogrammes servis par le backend, relayés en flux
#[get("/media/{path:.*}")]
pub async fn workspace_media(
    req: HttpRequest,
    session: ClientSession,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let path = path.into_inner();
    validate_relative_path(&path)?;
    let target = match req.query_string() {
        "" => path,
        query => format!("{}?{}", path, query),
    };

    let response = state.backend.media(session.bearer()?, &target).await?;
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| content_type_for(&target).to_string());

    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .streaming(response.bytes_stream()))
}

/// Objets des stockages local et mémoire (cible de leurs URLs média)
#[get("/{bucket}/{key:.*}")]
pub async fn serve_file(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (bucket, key) = path.into_inner();
    let uri = ObjectUri::new(bucket, key);
    debug!("Lecture de {}", uri);
    let bytes = state.store.read(&uri).await?;

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&uri.path))
        .body(bytes))
}
