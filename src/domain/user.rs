use serde::{Deserialize, Serialize};
use validator::Validate;

/// Utilisateur tel que renvoyé par `users/me` (le hash du mot de passe n'est jamais exposé)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Nom complet de l'utilisateur
    pub name: String,
    /// Email de l'utilisateur (identifiant de connexion)
    pub email: String,
}

/// Token d'accès délivré par le backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Formulaire de connexion, transmis URL-encodé au backend
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Format d'email invalide"))]
    pub username: String,
    #[validate(length(min = 1, message = "Le mot de passe est requis"))]
    pub password: String,
}
