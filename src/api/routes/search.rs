use actix_web::{post, web, HttpResponse};
use tracing::info;

use crate::core::session::ClientSession;
use crate::domain::GatherRequest;
use crate::utils::error::Result;
use crate::utils::validation::{validate_call_types, validate_positive_number, validate_species_codes};
use crate::AppState;

/// Collecte d'exemples candidats autour d'espèces cibles
#[post("/search/gather")]
pub async fn gather_examples(
    session: ClientSession,
    request: web::Json<GatherRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    validate_species_codes(&request.species_codes)?;
    validate_call_types(&request.call_types)?;
    validate_positive_number(request.num_targets, "num_targets")?;
    validate_positive_number(request.num_examples_per_target, "num_examples_per_target")?;

    let project_id = session.project_id()?;
    let reply = state
        .backend
        .gather_possible_examples(session.bearer()?, project_id, &request)
        .await?;
    info!(
        "🔎 Recherche lancée pour {} dans le projet {}",
        request.species_codes.join(", "),
        project_id
    );
    Ok(HttpResponse::Ok().json(reply))
}
