//! Session persistence
//!
//! After a successful login the [`Identity`] is sealed into a token and handed
//! to the client, either as a cookie or as a bearer token. Later requests
//! present the token and get the identity back without touching the
//! authentication backend.

mod cookie;

pub use cookie::CookieSessionStore;

use http::HeaderMap;
use serde::{Deserialize, Serialize};
use warden_core::{Identity, Result};

/// Sealed session contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
}

impl SessionPayload {
    pub fn for_user(identity: &Identity) -> Self {
        Self {
            user: Some(identity.clone()),
        }
    }
}

/// Stores an identity on a response and reads it back from later requests.
///
/// A missing, tampered or expired session is not an error: retrieval
/// returns `Ok(None)` and the caller treats the request as anonymous.
pub trait SessionStore: Send + Sync {
    /// Append a `Set-Cookie` header carrying `identity` to `response`
    fn store_identity(&self, response: &mut HeaderMap, identity: &Identity) -> Result<()>;

    /// Read the identity from the session cookie in `request`
    fn retrieve_identity(&self, request: &HeaderMap) -> Result<Option<Identity>>;

    /// Read the identity from a raw token (bearer header, CLI argument)
    fn retrieve_identity_from_token(&self, token: &str) -> Result<Option<Identity>>;

    /// Append a `Set-Cookie` header that removes the session cookie
    fn forget_identity(&self, response: &mut HeaderMap) -> Result<()>;

    /// Mint a token for `identity` without attaching it to a response
    fn issue_token(&self, identity: &Identity) -> Result<String>;
}
