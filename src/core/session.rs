// core/session.rs
use actix_web::cookie::{Cookie, SameSite};
use tracing::warn;

use crate::domain::Project;
use crate::utils::error::{AppError, Result};

/// Clé de persistance du token bearer
pub const TOKEN_KEY: &str = "token";

/// Clé de persistance du projet courant (JSON de `Project`)
pub const CURRENT_PROJECT_KEY: &str = "current_project";

/// État conservé côté client entre deux requêtes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientSession {
    pub token: Option<String>,
    pub current_project: Option<Project>,
}

impl ClientSession {
    pub fn new(token: Option<String>, current_project: Option<Project>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
            current_project,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Token bearer, ou `Unauthorized` si la session n'en a pas
    pub fn bearer(&self) -> Result<&str> {
        self.token.as_deref().ok_or(AppError::Unauthorized)
    }

    pub fn project(&self) -> Result<&Project> {
        self.current_project.as_ref().ok_or(AppError::NoProjectSelected)
    }

    pub fn project_id(&self) -> Result<i64> {
        Ok(self.project()?.id)
    }
}

/// Encode un projet pour le cookie `current_project`
pub fn encode_project(project: &Project) -> Result<String> {
    let raw = serde_json::to_string(project)?;
    Ok(urlencoding::encode(&raw).into_owned())
}

/// Relit la valeur d'un cookie `current_project`, encodée ou non.
/// Une valeur illisible est traitée comme « aucun projet ».
pub fn decode_project(value: &str) -> Option<Project> {
    if let Ok(project) = serde_json::from_str(value) {
        return Some(project);
    }
    let decoded = urlencoding::decode(value).ok()?;
    match serde_json::from_str(&decoded) {
        Ok(project) => Some(project),
        Err(e) => {
            warn!("Ignoring unreadable {} cookie: {}", CURRENT_PROJECT_KEY, e);
            None
        }
    }
}

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .finish()
}

pub fn token_cookie(token: &str, secure: bool) -> Cookie<'static> {
    session_cookie(TOKEN_KEY, token.to_string(), secure)
}

pub fn project_cookie(project: &Project, secure: bool) -> Result<Cookie<'static>> {
    Ok(session_cookie(CURRENT_PROJECT_KEY, encode_project(project)?, secure))
}

/// Cookie qui efface une clé côté client
pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project {
            id: 3,
            name: "Caples, 2023".into(),
            description: None,
        }
    }

    #[test]
    fn project_cookie_round_trips_encoded_and_plain() {
        let encoded = encode_project(&project()).unwrap();
        assert!(!encoded.contains('"'));
        assert_eq!(decode_project(&encoded), Some(project()));
        assert_eq!(
            decode_project(r#"{"id":3,"name":"Caples, 2023"}"#),
            Some(project())
        );
        assert_eq!(decode_project("garbage"), None);
    }

    #[test]
    fn missing_values_map_to_errors() {
        let session = ClientSession::new(Some(String::new()), None);
        assert!(!session.is_authenticated());
        assert!(matches!(session.bearer(), Err(AppError::Unauthorized)));
        assert!(matches!(session.project_id(), Err(AppError::NoProjectSelected)));

        let session = ClientSession::new(Some("tok".into()), Some(project()));
        assert_eq!(session.bearer().unwrap(), "tok");
        assert_eq!(session.project_id().unwrap(), 3);
    }

    #[test]
    fn token_cookie_is_http_only() {
        let cookie = token_cookie("tok", true);
        assert_eq!(cookie.name(), TOKEN_KEY);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(removal_cookie(TOKEN_KEY).value(), "");
    }
}
