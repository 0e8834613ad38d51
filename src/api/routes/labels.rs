use actix_web::{get, put, web, HttpResponse};
use tracing::info;

use super::annotate::LabelsBody;
use crate::core::session::ClientSession;
use crate::utils::error::Result;
use crate::utils::validation::validate_labels;
use crate::AppState;

/// Nombre d'annotations par label
#[get("/labels")]
pub async fn label_summary(
    session: ClientSession,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let summary = state
        .backend
        .label_summary(session.bearer()?, session.project_id()?)
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[get("/labels/{label}/annotations")]
pub async fn annotations_by_label(
    session: ClientSession,
    label: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let recordings = state
        .backend
        .annotations_by_label(session.bearer()?, session.project_id()?, &label)
        .await?;
    Ok(HttpResponse::Ok().json(recordings))
}

/// Remplace les labels d'un enregistrement déjà annoté
#[put("/annotations/{embedding_id}")]
pub async fn relabel(
    session: ClientSession,
    embedding_id: web::Path<i64>,
    body: web::Json<LabelsBody>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    validate_labels(&body.labels)?;
    let embedding_id = embedding_id.into_inner();
    let reply = state
        .backend
        .relabel_example(
            session.bearer()?,
            session.project_id()?,
            embedding_id,
            &body.labels,
        )
        .await?;
    info!("🏷️  Embedding {} relabellisé: {}", embedding_id, body.labels.join(", "));
    Ok(HttpResponse::Ok().json(reply))
}

/// Statistiques globales du projet courant
#[get("/summary")]
pub async fn recordings_summary(
    session: ClientSession,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let summary = state
        .backend
        .summary(session.bearer()?, session.project_id()?)
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}
