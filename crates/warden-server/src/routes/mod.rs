//! HTTP handlers

use axum::{
    extract::{FromRequest, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use warden_auth::{Authenticator, SessionStore};
use warden_core::Identity;

use crate::error::ApiError;
use crate::server::AppState;

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WhoamiResponse {
    pub user_id: String,
}

/// Login credentials from a JSON or form-encoded body
pub struct Credentials(pub LoginRequest);

impl<S> FromRequest<S> for Credentials
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(body) = Form::<LoginRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(body))
        } else {
            let Json(body) = Json::<LoginRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(body))
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Credentials(credentials): Credentials,
) -> Result<(HeaderMap, Json<LoginResponse>), ApiError> {
    let identity = state
        .service
        .authenticate(&credentials.username, &credentials.password)
        .await?;

    let mut headers = HeaderMap::new();
    state.service.store_identity(&mut headers, &identity)?;
    let token = state.service.issue_token(&identity)?;

    info!("User logged in: {}", identity);

    Ok((
        headers,
        Json(LoginResponse {
            user_id: identity.into_user_id(),
            token,
        }),
    ))
}

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
) -> Result<(StatusCode, HeaderMap), ApiError> {
    let mut headers = HeaderMap::new();
    state.service.forget_identity(&mut headers)?;
    debug!("Session cookie cleared");
    Ok((StatusCode::NO_CONTENT, headers))
}

/// GET /whoami
pub async fn whoami(Extension(identity): Extension<Identity>) -> Json<WhoamiResponse> {
    Json(WhoamiResponse {
        user_id: identity.into_user_id(),
    })
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}
