use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;

use crate::core::session::ClientSession;
use crate::domain::ClassifierSearch;
use crate::utils::error::Result;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub search: Option<String>,
}

#[get("/classifier/runs")]
pub async fn list_runs(
    session: ClientSession,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let runs = state.classifier.runs(&session).await?;
    Ok(HttpResponse::Ok().json(runs))
}

/// Demande au backend d'entraîner et d'appliquer un classifieur
#[post("/classifier/runs")]
pub async fn run_classifier(
    session: ClientSession,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let reply = state.classifier.run(&session).await?;
    Ok(HttpResponse::Accepted().json(reply))
}

#[get("/classifier/runs/{run_id}/results")]
pub async fn run_results(
    session: ClientSession,
    run_id: web::Path<i64>,
    query: web::Query<ResultsQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let results = state
        .classifier
        .results(&session, run_id.into_inner(), query.label.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(results))
}

/// Nombre de résultats par label (`?search=` filtre par sous-chaîne)
#[get("/classifier/runs/{run_id}/summary")]
pub async fn run_summary(
    session: ClientSession,
    run_id: web::Path<i64>,
    query: web::Query<SummaryQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let summary = state
        .classifier
        .summary(&session, run_id.into_inner(), query.search.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[post("/classifier/search")]
pub async fn search_results(
    session: ClientSession,
    search: web::Json<ClassifierSearch>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let results = state.classifier.search(&session, &search).await?;
    Ok(HttpResponse::Ok().json(results))
}
