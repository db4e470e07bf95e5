//! LDAP authentication
//!
//! Verifies credentials with the usual two-bind exchange: bind as a service
//! account, search for the user's entry, then bind as that entry with the
//! supplied password. Supports LDAP, LDAPS and STARTTLS.

mod client;
mod directory;
mod types;

pub use client::LdapAuthenticator;
pub use directory::{
    BindOutcome, DirectoryConnection, DirectoryConnector, DirectoryError, Ldap3Connector,
};
pub use types::*;
