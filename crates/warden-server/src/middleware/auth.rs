//! Session authentication middleware

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use warden_auth::SessionStore;
use warden_core::{Identity, Result};

use crate::error::ApiError;
use crate::server::AppState;

/// Resolve the caller's identity.
///
/// Supports two session carriers:
/// 1. Bearer token: `Authorization: Bearer <token>`
/// 2. Session cookie set by `POST /login`
///
/// When a bearer token is present it alone decides; the cookie is not
/// consulted.
pub fn resolve_identity(
    store: &dyn SessionStore,
    headers: &HeaderMap,
) -> Result<Option<Identity>> {
    match bearer_token(headers) {
        Some(token) => store.retrieve_identity_from_token(token),
        None => store.retrieve_identity(headers),
    }
}

/// Reject requests without a valid session and expose the [`Identity`] to
/// handlers as a request extension
pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let identity = resolve_identity(&state.service, request.headers())?;

    match identity {
        Some(identity) => {
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        None => {
            debug!("No valid session on {}", request.uri().path());
            Err(ApiError::Unauthenticated)
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(bearer_token(&headers), Some("xyz"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);
    }
}
