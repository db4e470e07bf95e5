//! Authentication service
//!
//! Composes one [`SessionStore`] with one [`Authenticator`]. Request handlers
//! hold a clone and call both capabilities through it.

use async_trait::async_trait;
use http::HeaderMap;
use std::sync::Arc;
use tracing::info;
use warden_core::{AuthenticatorKind, Identity, Result, WardenConfig};

use crate::authenticator::Authenticator;
use crate::dummy::DummyAuthenticator;
use crate::ldap::LdapAuthenticator;
use crate::session::{CookieSessionStore, SessionStore};

#[derive(Clone)]
pub struct AuthenticationService {
    store: Arc<dyn SessionStore>,
    authenticator: Arc<dyn Authenticator>,
}

impl AuthenticationService {
    pub fn new(store: Arc<dyn SessionStore>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            store,
            authenticator,
        }
    }

    /// Build the cookie store and the authenticator named by `auth.type`
    pub fn from_config(config: &WardenConfig) -> Result<Self> {
        let store = Arc::new(CookieSessionStore::from_config(&config.session)?);

        let authenticator: Arc<dyn Authenticator> = match config.auth.kind()? {
            AuthenticatorKind::Dummy => Arc::new(DummyAuthenticator::from_config(&config.dummy)?),
            AuthenticatorKind::Ldap => Arc::new(LdapAuthenticator::from_config(&config.ldap)?),
        };

        info!(
            "Authentication service ready (authenticator: {}, cookie: {})",
            authenticator.kind(),
            store.cookie_name()
        );

        Ok(Self::new(store, authenticator))
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
        &self.authenticator
    }
}

impl SessionStore for AuthenticationService {
    fn store_identity(&self, response: &mut HeaderMap, identity: &Identity) -> Result<()> {
        self.store.store_identity(response, identity)
    }

    fn retrieve_identity(&self, request: &HeaderMap) -> Result<Option<Identity>> {
        self.store.retrieve_identity(request)
    }

    fn retrieve_identity_from_token(&self, token: &str) -> Result<Option<Identity>> {
        self.store.retrieve_identity_from_token(token)
    }

    fn forget_identity(&self, response: &mut HeaderMap) -> Result<()> {
        self.store.forget_identity(response)
    }

    fn issue_token(&self, identity: &Identity) -> Result<String> {
        self.store.issue_token(identity)
    }
}

#[async_trait]
impl Authenticator for AuthenticationService {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Identity> {
        self.authenticator.authenticate(username, password).await
    }

    fn kind(&self) -> &'static str {
        self.authenticator.kind()
    }
}
