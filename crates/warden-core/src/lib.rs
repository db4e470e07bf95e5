//! Warden Core Library
//!
//! Shared types, the error taxonomy, and configuration for the Warden
//! authentication façade.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AuthenticatorKind, WardenConfig};
pub use error::{Error, Result};
pub use types::Identity;

/// Warden version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default session cookie name
pub const DEFAULT_COOKIE_NAME: &str = "warden_session";

/// Default session lifetime (30 days)
pub const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

/// Longest accepted session lifetime (100 years)
pub const MAX_SESSION_MAX_AGE_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Default LDAP port
pub const DEFAULT_LDAP_PORT: u16 = 389;

/// Default per-step deadline for directory operations
pub const DEFAULT_LDAP_TIMEOUT_SECS: u64 = 10;
