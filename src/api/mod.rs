pub mod routes;

use actix_web::{web, HttpResponse, Responder};

use self::routes::middleware::RequireSession;
use crate::AppState;

/// Configure toutes les routes de l'API
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            // Routes publiques
            .service(routes::auth::login)
            .service(routes::auth::logout)
            .service(routes::auth::session)
            .service(routes::proxy::proxy_get)
            .service(routes::proxy::proxy_post)
            // Curation du stockage objet
            .service(
                web::scope("/curation")
                    .wrap(RequireSession)
                    .service(routes::curation::next_example)
                    .service(routes::curation::finish_example)
                    .service(routes::curation::example_counts)
                    .service(routes::curation::examples_for_class)
                    .service(routes::curation::annotate_recording)
                    .service(routes::curation::move_labeled_output)
                    .service(routes::curation::check_source_globs)
                    .service(routes::curation::user_project),
            )
            // Espace de travail (token obligatoire)
            .service(
                web::scope("/workspace")
                    .wrap(RequireSession)
                    .service(routes::projects::list_projects)
                    .service(routes::projects::current_project)
                    .service(routes::projects::select_project)
                    .service(routes::annotate::next_example)
                    .service(routes::annotate::annotate)
                    .service(routes::labels::label_summary)
                    .service(routes::labels::annotations_by_label)
                    .service(routes::labels::relabel)
                    .service(routes::labels::recordings_summary)
                    .service(routes::classifier::list_runs)
                    .service(routes::classifier::run_classifier)
                    .service(routes::classifier::run_results)
                    .service(routes::classifier::run_summary)
                    .service(routes::classifier::search_results)
                    .service(routes::search::gather_examples)
                    .service(routes::media::workspace_media),
            ),
    );

    // Fichiers des stockages local et mémoire
    cfg.service(
        web::scope("/files")
            .wrap(RequireSession)
            .service(routes::media::serve_file),
    );

    // Endpoint de santé
    cfg.service(web::resource("/health").route(web::get().to(health_check)));
}

/// Endpoint de santé pour monitoring
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "name": crate::NAME,
        "version": crate::VERSION,
        "backend": state.backend.base_url(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": state.run_mode
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::TOKEN_KEY;
    use crate::test_utils::test_state;
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use assert_json_diff::assert_json_include;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[actix_web::test]
    async fn health_reports_the_service() {
        let (state, _) = test_state("http://127.0.0.1:9");
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_json_include!(
            actual: body,
            expected: serde_json::json!({
                "status": "healthy",
                "name": crate::NAME,
                "version": crate::VERSION,
                "backend": "http://127.0.0.1:9"
            })
        );
    }

    #[actix_web::test]
    async fn workspace_routes_are_gated_and_wired() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/my_projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        let (state, _) = test_state(&server.uri());
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/workspace/projects")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/v1/workspace/projects")
            .cookie(Cookie::new(TOKEN_KEY, "tok"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/files/caples/a.wav").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn session_route_stays_public() {
        let (state, _) = test_state("http://127.0.0.1:9");
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/auth/session").to_request();
        let resp = test::call_service(&app, req).await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["view"], "login");
    }
}
