//! # API Middleware
//!
//! - `RequireSession` : protège les routes de l'espace de travail ; sans token
//!   la requête reçoit un 401 qui renvoie le client vers la page de connexion
//! - `ClientSession` est aussi un extracteur : token et projet courant sont lus
//!   dans les cookies `token` / `current_project`, ou dans l'en-tête
//!   `Authorization: Bearer` pour le token

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use tracing::debug;

use crate::core::session::{decode_project, ClientSession, CURRENT_PROJECT_KEY, TOKEN_KEY};
use crate::utils::error::AppError;

/// Reconstitue la session à partir des cookies et des en-têtes
pub fn session_from_request(req: &HttpRequest) -> ClientSession {
    let token = req
        .cookie(TOKEN_KEY)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            req.headers()
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(|token| token.trim().to_string())
        });

    let current_project = req
        .cookie(CURRENT_PROJECT_KEY)
        .and_then(|cookie| decode_project(cookie.value()));

    ClientSession::new(token, current_project)
}

impl FromRequest for ClientSession {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let stored = req.extensions().get::<ClientSession>().cloned();
        let session = stored.unwrap_or_else(|| session_from_request(req));
        ok(session)
    }
}

/// Middleware exigeant un token de session
pub struct RequireSession;

impl<S, B> Transform<S, ServiceRequest> for RequireSession
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireSessionService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequireSessionService { service })
    }
}

pub struct RequireSessionService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequireSessionService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let session = session_from_request(req.request());

        if !session.is_authenticated() {
            debug!("No session token for {}", req.path());
            let (request, _payload) = req.into_parts();
            let response = AppError::Unauthorized.error_response().map_into_right_body();
            return Box::pin(async move { Ok(ServiceResponse::new(request, response)) });
        }

        req.extensions_mut().insert(session);
        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
