use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;

use crate::core::session::ClientSession;
use crate::utils::error::Result;
use crate::AppState;

/// Corps `{"labels": [...]}` des annotations
#[derive(Debug, Deserialize)]
pub struct LabelsBody {
    pub labels: Vec<String>,
}

/// Prochain exemple candidat, ou `{"message": ...}` quand il n'y en a plus
#[get("/annotations/next")]
pub async fn next_example(
    session: ClientSession,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let next = state.annotation.next_example(&session).await?;
    Ok(HttpResponse::Ok().json(next))
}

/// Annote un embedding et renvoie l'exemple suivant
#[post("/annotations/{embedding_id}")]
pub async fn annotate(
    session: ClientSession,
    embedding_id: web::Path<i64>,
    body: web::Json<LabelsBody>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let next = state
        .annotation
        .annotate_and_advance(&session, embedding_id.into_inner(), &body.labels)
        .await?;
    Ok(HttpResponse::Ok().json(next))
}
