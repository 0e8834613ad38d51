// core/auth_service.rs
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::core::session::ClientSession;
use crate::domain::{LoginForm, User};
use crate::services::backend::{BackendClient, INVALID_CREDENTIALS};
use crate::utils::error::{AppError, Result};

/// Message affiché quand le backend est injoignable pendant la connexion
pub const LOGIN_TRANSPORT_ERROR: &str = "An error occurred during login";

/// Vue à présenter au client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    Home {
        user: User,
    },
    Login {
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl View {
    pub fn login() -> Self {
        View::Login { error: None }
    }

    pub fn login_error(message: impl Into<String>) -> Self {
        View::Login {
            error: Some(message.into()),
        }
    }

    pub fn is_home(&self) -> bool {
        matches!(self, View::Home { .. })
    }
}

/// Effet à appliquer sur le token stocké côté client
#[derive(Debug, Clone, PartialEq)]
pub enum TokenChange {
    Store(String),
    Clear,
    Keep,
}

/// Résultat du portail d'authentification
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    pub view: View,
    pub token: TokenChange,
}

pub struct AuthService {
    backend: Arc<BackendClient>,
}

impl AuthService {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    /// Connexion : le backend vérifie les identifiants, le portail garde le token
    pub async fn login(&self, form: &LoginForm) -> Result<Gate> {
        form.validate()?;

        let token = match self.backend.login(&form.username, &form.password).await {
            Ok(token) => token,
            Err(AppError::InvalidCredentials(detail)) => {
                return Ok(Gate {
                    view: View::login_error(detail),
                    token: TokenChange::Clear,
                })
            }
            Err(e) => {
                warn!("Login transport failure: {}", e);
                return Ok(Gate {
                    view: View::login_error(LOGIN_TRANSPORT_ERROR),
                    token: TokenChange::Keep,
                });
            }
        };

        // Le token vient d'être émis : un refus ici reste un échec d'identifiants
        let user = match self.backend.current_user(&token.access_token).await {
            Ok(user) => user,
            Err(AppError::Unauthorized) => {
                return Ok(Gate {
                    view: View::login_error(INVALID_CREDENTIALS),
                    token: TokenChange::Clear,
                })
            }
            Err(e) => {
                warn!("Could not load user after login: {}", e);
                return Ok(Gate {
                    view: View::login_error(LOGIN_TRANSPORT_ERROR),
                    token: TokenChange::Keep,
                });
            }
        };

        info!("🔑 Utilisateur connecté: {}", user.email);
        Ok(Gate {
            view: View::Home { user },
            token: TokenChange::Store(token.access_token),
        })
    }

    /// Choisit la vue d'après le token de la session
    pub async fn resolve(&self, session: &ClientSession) -> Result<Gate> {
        let token = match session.token.as_deref() {
            Some(token) => token,
            None => {
                return Ok(Gate {
                    view: View::login(),
                    token: TokenChange::Keep,
                })
            }
        };

        match self.backend.current_user(token).await {
            Ok(user) => Ok(Gate {
                view: View::Home { user },
                token: TokenChange::Keep,
            }),
            Err(AppError::Unauthorized) => Ok(Gate {
                view: View::login(),
                token: TokenChange::Clear,
            }),
            Err(e) => Err(e),
        }
    }
}
