//! Authentication for Warden
//!
//! - [`Authenticator`]: verifies a username/password pair (`dummy`, `ldap`)
//! - [`SessionStore`]: carries the resulting [`Identity`] across requests in a
//!   sealed cookie or bearer token
//! - [`AuthenticationService`]: one of each, selected from configuration

pub mod authenticator;
pub mod dummy;
pub mod ldap;
pub mod service;
pub mod session;

pub use authenticator::Authenticator;
pub use dummy::DummyAuthenticator;
pub use ldap::{LdapAuthenticator, LdapFailure, LdapSettings};
pub use service::AuthenticationService;
pub use session::{CookieSessionStore, SessionPayload, SessionStore};

pub use warden_core::{Error, Identity, Result};
