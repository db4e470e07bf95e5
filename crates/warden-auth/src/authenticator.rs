//! Authenticator capability

use async_trait::async_trait;
use warden_core::{Identity, Result};

/// A backend that verifies a username/password pair.
///
/// Every rejection is reported as [`Error::InvalidCredentials`] without
/// saying whether the user or the password was wrong. Backend faults are
/// [`Error::BackendUnavailable`] with a generic message; implementations log
/// the detailed cause instead of returning it.
///
/// [`Error::InvalidCredentials`]: warden_core::Error::InvalidCredentials
/// [`Error::BackendUnavailable`]: warden_core::Error::BackendUnavailable
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Check the credentials and return the identity they prove
    async fn authenticate(&self, username: &str, password: &str) -> Result<Identity>;

    /// Backend name for logs
    fn kind(&self) -> &'static str;
}
