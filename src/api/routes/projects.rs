use actix_web::{get, put, web, HttpResponse};
use tracing::info;

use crate::core::session::{project_cookie, ClientSession};
use crate::domain::Project;
use crate::utils::error::{AppError, Result};
use crate::AppState;

/// Projets accessibles à l'utilisateur connecté
#[get("/projects")]
pub async fn list_projects(
    session: ClientSession,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let projects = state.annotation.projects(&session).await?;
    Ok(HttpResponse::Ok().json(projects))
}

#[get("/projects/current")]
pub async fn current_project(session: ClientSession) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(session.project()?))
}

/// Sélectionne le projet courant parmi ceux de l'utilisateur
#[put("/projects/current")]
pub async fn select_project(
    session: ClientSession,
    selection: web::Json<Project>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let projects = state.annotation.projects(&session).await?;
    let project = projects
        .into_iter()
        .find(|p| p.id == selection.id)
        .ok_or_else(|| AppError::NotFound(format!("project {}", selection.id)))?;

    info!("📂 Projet courant: {} ({})", project.name, project.id);
    Ok(HttpResponse::Ok()
        .cookie(project_cookie(&project, state.cookie_secure)?)
        .json(&project))
}
