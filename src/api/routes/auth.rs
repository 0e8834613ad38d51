use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpResponse, HttpResponseBuilder};

use crate::core::session::{removal_cookie, token_cookie, ClientSession, CURRENT_PROJECT_KEY, TOKEN_KEY};
use crate::core::{Gate, TokenChange, View};
use crate::domain::LoginForm;
use crate::utils::error::Result;
use crate::AppState;

/// Construit la réponse d'une vue, en appliquant l'effet sur le token
fn gate_response(gate: Gate, secure: bool) -> HttpResponse {
    let status = match &gate.view {
        View::Login { error: Some(_) } => StatusCode::UNAUTHORIZED,
        _ => StatusCode::OK,
    };
    let mut builder = HttpResponseBuilder::new(status);
    match &gate.token {
        TokenChange::Store(token) => {
            builder.cookie(token_cookie(token, secure));
        }
        TokenChange::Clear => {
            builder.cookie(removal_cookie(TOKEN_KEY));
        }
        TokenChange::Keep => {}
    }
    builder.json(&gate.view)
}

/// Connexion (formulaire URL-encodé `username` / `password`)
#[post("/auth/login")]
pub async fn login(
    form: web::Form<LoginForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let gate = state.auth.login(&form).await?;
    Ok(gate_response(gate, state.cookie_secure))
}

/// Déconnexion : oublie le token et le projet courant
#[post("/auth/logout")]
pub async fn logout() -> HttpResponse {
    HttpResponse::Ok()
        .cookie(removal_cookie(TOKEN_KEY))
        .cookie(removal_cookie(CURRENT_PROJECT_KEY))
        .json(View::login())
}

/// Vue courante d'après la session
#[get("/auth/session")]
pub async fn session(
    session: ClientSession,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let gate = state.auth.resolve(&session).await?;
    Ok(gate_response(gate, state.cookie_secure))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_state;
    use actix_web::cookie::Cookie;
    use actix_web::{test, App};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_login(server: &MockServer, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_me(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"name": "Ana", "email": "ana@example.org"})),
            )
            .mount(server)
            .await;
    }

    #[actix_web::test]
    async fn successful_login_sets_the_token_cookie() {
        let server = MockServer::start().await;
        mount_login(&server, 200, json!({"access_token": "tok", "token_type": "bearer"})).await;
        mount_me(&server).await;
        let (state, _) = test_state(&server.uri());

        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).service(login),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_form([("username", "ana@example.org"), ("password", "pw")])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let token = resp
            .response()
            .cookies()
            .find(|c| c.name() == TOKEN_KEY)
            .map(|c| c.value().to_string());
        assert_eq!(token.as_deref(), Some("tok"));
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["view"], "home");
        assert_eq!(body["user"]["email"], "ana@example.org");
    }

    #[actix_web::test]
    async fn rejected_login_returns_the_login_view() {
        let server = MockServer::start().await;
        mount_login(&server, 401, json!({"detail": "Incorrect username or password"})).await;
        let (state, _) = test_state(&server.uri());

        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).service(login),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_form([("username", "ana@example.org"), ("password", "bad")])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"view": "login", "error": "Incorrect username or password"}));
    }

    #[actix_web::test]
    async fn session_reports_home_for_a_valid_token() {
        let server = MockServer::start().await;
        mount_me(&server).await;
        let (state, _) = test_state(&server.uri());

        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).service(session),
        )
        .await;

        let anonymous = test::TestRequest::get().uri("/auth/session").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, anonymous).await;
        assert_eq!(body, json!({"view": "login"}));

        let req = test::TestRequest::get()
            .uri("/auth/session")
            .cookie(Cookie::new(TOKEN_KEY, "tok"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["view"], "home");
    }

    #[actix_web::test]
    async fn logout_clears_both_keys() {
        let app = test::init_service(App::new().service(logout)).await;
        let resp = test::call_service(&app, test::TestRequest::post().uri("/auth/logout").to_request()).await;
        let cleared: Vec<String> = resp
            .response()
            .cookies()
            .filter(|c| c.value().is_empty())
            .map(|c| c.name().to_string())
            .collect();
        assert!(cleared.contains(&TOKEN_KEY.to_string()));
        assert!(cleared.contains(&CURRENT_PROJECT_KEY.to_string()));
    }
}
