// api/routes/curation.rs
use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::core::curation_service::NO_MORE_EXAMPLES;
use crate::domain::{ExampleType, LabeledOutput, PrecomputedExample};
use crate::utils::error::{AppError, Result};
use crate::AppState;

/// Réponse quand l'email n'a pas de projet par défaut
pub const USER_NOT_FOUND: &str = "User not found";

#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    pub project: String,
}

#[derive(Debug, Deserialize)]
pub struct FinishRequest {
    pub project: String,
    pub example: PrecomputedExample,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamplesRequest {
    pub project: String,
    pub example_type: ExampleType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassExamplesRequest {
    pub project: String,
    pub example_type: ExampleType,
    pub example_class: String,
}

#[derive(Debug, Deserialize)]
pub struct AnnotateRecordingRequest {
    pub project: String,
    pub example: PrecomputedExample,
    #[serde(alias = "vocType")]
    pub voc_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub project: String,
    pub example: LabeledOutput,
    pub new_example_class: String,
}

#[derive(Debug, Deserialize)]
pub struct SourceGlobRequest {
    pub glob: String,
}

#[derive(Debug, Deserialize)]
pub struct UserProjectRequest {
    pub email: String,
}

/// Prochaine paire audio/spectrogramme non labellisée
#[post("/next_example")]
pub async fn next_example(
    request: web::Json<ProjectRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    match state.curation.next_example(&request.project).await? {
        Some(example) => Ok(HttpResponse::Ok().json(json!({ "success": true, "example": example }))),
        None => Ok(HttpResponse::Ok().json(json!({ "success": false, "error": NO_MORE_EXAMPLES }))),
    }
}

#[post("/finish")]
pub async fn finish_example(
    request: web::Json<FinishRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    state
        .curation
        .finish_example(&request.project, &request.example)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// Comptage des exemples par classe
#[post("/examples")]
pub async fn example_counts(
    request: web::Json<ExamplesRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let examples = state
        .curation
        .example_counts(&request.project, request.example_type)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "examples": examples })))
}

#[post("/examples/class")]
pub async fn examples_for_class(
    request: web::Json<ClassExamplesRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let examples = state
        .curation
        .examples_for_class(&request.project, request.example_type, &request.example_class)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "examples": examples })))
}

#[post("/annotate")]
pub async fn annotate_recording(
    request: web::Json<AnnotateRecordingRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let target = state
        .curation
        .annotate_recording(&request.project, &request.example, &request.voc_type)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "gsuri": target.to_string() })))
}

#[post("/move")]
pub async fn move_labeled_output(
    request: web::Json<MoveRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let target = state
        .curation
        .move_labeled_output(&request.project, &request.example, &request.new_example_class)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "gsuri": target.to_string() })))
}

/// Vérifie un motif de fichiers sources ; l'échec est rapporté dans le corps
#[post("/source_globs")]
pub async fn check_source_globs(
    request: web::Json<SourceGlobRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    HttpResponse::Ok().json(state.curation.check_source_glob(&request.glob).await)
}

#[post("/user_project")]
pub async fn user_project(
    request: web::Json<UserProjectRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    match state.curation.default_project(&request.email) {
        Ok(project) => Ok(HttpResponse::Ok().json(json!({ "success": true, "project": project }))),
        Err(AppError::UserNotFound(_)) => {
            Ok(HttpResponse::Ok().json(json!({ "success": false, "error": USER_NOT_FOUND })))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes::middleware::RequireSession;
    use crate::core::session::TOKEN_KEY;
    use crate::infrastructure::storage::{MemoryObjectStore, ObjectStore, ObjectUri};
    use crate::test_utils::test_state;
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::Value;
    use std::sync::Arc;

    macro_rules! curation_app {
        ($state:expr) => {
            test::init_service(
                App::new().app_data(web::Data::new($state)).service(
                    web::scope("/curation")
                        .wrap(RequireSession)
                        .service(next_example)
                        .service(finish_example)
                        .service(example_counts)
                        .service(examples_for_class)
                        .service(annotate_recording)
                        .service(move_labeled_output)
                        .service(check_source_globs)
                        .service(user_project),
                ),
            )
            .await
        };
    }

    async fn seed(store: &Arc<MemoryObjectStore>, key: &str) {
        store
            .write(&ObjectUri::new("caples", key), b"x".to_vec())
            .await
            .unwrap();
    }

    fn post(uri: &str, body: Value) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .cookie(Cookie::new(TOKEN_KEY, "tok"))
            .set_json(body)
    }

    #[actix_web::test]
    async fn label_one_example_then_run_out() {
        let (state, store) = test_state("http://127.0.0.1:9");
        seed(&store, "search/site.wav^_^10^_^amro.wav").await;
        seed(&store, "search/site.wav^_^10^_^amro.png").await;
        let app = curation_app!(state);

        let reply: Value = test::call_and_read_body_json(
            &app,
            post("/curation/next_example", json!({"project": "caples"})).to_request(),
        )
        .await;
        assert_eq!(reply["success"], true);
        let example = reply["example"].clone();
        assert_eq!(example["species"], "amro");
        assert_eq!(example["gsuri"], "gs://caples/search/site.wav^_^10^_^amro.wav");

        let reply: Value = test::call_and_read_body_json(
            &app,
            post("/curation/finish", json!({"project": "caples", "example": example})).to_request(),
        )
        .await;
        assert_eq!(reply, json!({"success": true}));

        let reply: Value = test::call_and_read_body_json(
            &app,
            post("/curation/next_example", json!({"project": "caples"})).to_request(),
        )
        .await;
        assert_eq!(reply, json!({"success": false, "error": NO_MORE_EXAMPLES}));
    }

    #[actix_web::test]
    async fn unknown_project_is_a_not_found() {
        let (state, _) = test_state("http://127.0.0.1:9");
        let app = curation_app!(state);

        let resp = test::call_service(
            &app,
            post("/curation/next_example", json!({"project": "nowhere"})).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn annotate_then_move_between_classes() {
        let (state, store) = test_state("http://127.0.0.1:9");
        seed(&store, "search/site.wav^_^10^_^amro.wav").await;
        let app = curation_app!(state);

        let example = json!({
            "gsuri": "gs://caples/search/site.wav^_^10^_^amro.wav",
            "audio_url": "a", "spec_url": "s",
            "filename": "site.wav", "species": "amro", "timestampS": "10"
        });
        let reply: Value = test::call_and_read_body_json(
            &app,
            post(
                "/curation/annotate",
                json!({"project": "caples", "example": example, "voc_type": "song"}),
            )
            .to_request(),
        )
        .await;
        assert_eq!(reply["gsuri"], "gs://caples/labeled/amro_song/site___10.wav");

        let counts: Value = test::call_and_read_body_json(
            &app,
            post(
                "/curation/examples",
                json!({"project": "caples", "exampleType": "labeledOutputs"}),
            )
            .to_request(),
        )
        .await;
        assert_eq!(counts["examples"], json!([{"class": "amro_song", "number": 1}]));

        let listed: Value = test::call_and_read_body_json(
            &app,
            post(
                "/curation/examples/class",
                json!({"project": "caples", "exampleType": "labeledOutputs", "exampleClass": "amro_song"}),
            )
            .to_request(),
        )
        .await;
        let output = listed["examples"][0].clone();
        assert_eq!(output["filename"], "site");
        assert_eq!(output["timestamp_s"], "10");

        let reply: Value = test::call_and_read_body_json(
            &app,
            post(
                "/curation/move",
                json!({"project": "caples", "example": output, "newExampleClass": "amro_call"}),
            )
            .to_request(),
        )
        .await;
        assert_eq!(reply["gsuri"], "gs://caples/labeled/amro_call/site___10.wav");
    }

    #[actix_web::test]
    async fn invalid_voc_type_is_rejected() {
        let (state, store) = test_state("http://127.0.0.1:9");
        seed(&store, "search/site.wav^_^10^_^amro.wav").await;
        let app = curation_app!(state);

        let example = json!({
            "gsuri": "gs://caples/search/site.wav^_^10^_^amro.wav",
            "audio_url": "a", "spec_url": "s",
            "filename": "site.wav", "species": "amro", "timestamp_s": "10"
        });
        let resp = test::call_service(
            &app,
            post(
                "/curation/annotate",
                json!({"project": "caples", "example": example, "voc_type": "drum"}),
            )
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn glob_check_and_user_project_never_fail_the_request() {
        let (state, store) = test_state("http://127.0.0.1:9");
        seed(&store, "audio/2024/a.wav").await;
        seed(&store, "audio/2024/b.flac").await;
        let app = curation_app!(state);

        let reply: Value = test::call_and_read_body_json(
            &app,
            post("/curation/source_globs", json!({"glob": "gs://caples/audio/*/*.wav"})).to_request(),
        )
        .await;
        assert_eq!(reply["success"], true);
        assert_eq!(reply["files"], json!(["audio/2024/a.wav"]));

        let reply: Value = test::call_and_read_body_json(
            &app,
            post("/curation/source_globs", json!({"glob": "not-a-uri"})).to_request(),
        )
        .await;
        assert_eq!(reply["success"], false);
        assert_eq!(reply["files"], json!([]));

        let reply: Value = test::call_and_read_body_json(
            &app,
            post("/curation/user_project", json!({"email": "ana@example.org"})).to_request(),
        )
        .await;
        assert_eq!(reply, json!({"success": true, "project": "caples"}));

        let reply: Value = test::call_and_read_body_json(
            &app,
            post("/curation/user_project", json!({"email": "bob@example.org"})).to_request(),
        )
        .await;
        assert_eq!(reply, json!({"success": false, "error": USER_NOT_FOUND}));
    }

    #[actix_web::test]
    async fn curation_requires_a_session() {
        let (state, _) = test_state("http://127.0.0.1:9");
        let app = curation_app!(state);

        let req = test::TestRequest::post()
            .uri("/curation/user_project")
            .set_json(json!({"email": "ana@example.org"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
