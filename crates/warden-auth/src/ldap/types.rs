//! LDAP settings, filter templating and failure causes

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use warden_core::config::LdapConfig;
use warden_core::{Error, Result};

use super::directory::DirectoryError;

// ============================================================================
// Settings
// ============================================================================

/// Validated connection and lookup parameters, fixed for the process lifetime
#[derive(Clone)]
pub struct LdapSettings {
    /// ldap:// or ldaps:// URL
    pub url: String,
    /// Use STARTTLS for connection upgrade
    pub start_tls: bool,
    /// Service account DN
    pub bind_dn: String,
    pub bind_password: String,
    /// Base DN for the user search
    pub base_dn: String,
    pub filter: FilterTemplate,
    /// Deadline for each protocol step
    pub timeout: Duration,
}

impl LdapSettings {
    pub fn from_config(config: &LdapConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            url: config.url(),
            start_tls: config.start_tls,
            bind_dn: config.bind_dn.clone(),
            bind_password: config.bind_password.clone(),
            base_dn: config.base_dn.clone(),
            filter: FilterTemplate::parse(&config.username_lookup)?,
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }
}

impl fmt::Debug for LdapSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LdapSettings")
            .field("url", &self.url)
            .field("start_tls", &self.start_tls)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &"<redacted>")
            .field("base_dn", &self.base_dn)
            .field("filter", &self.filter)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// Filter template
// ============================================================================

/// Search filter with exactly one username slot.
///
/// The username is escaped before substitution, so `*`, parentheses,
/// backslashes and NUL cannot change the structure of the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTemplate {
    prefix: String,
    suffix: String,
}

impl FilterTemplate {
    pub const PLACEHOLDER: &'static str = "{username}";

    /// printf-style slot accepted for older configuration files
    pub const LEGACY_PLACEHOLDER: &'static str = "%s";

    pub fn parse(template: &str) -> Result<Self> {
        let slots = template.matches(Self::PLACEHOLDER).count()
            + template.matches(Self::LEGACY_PLACEHOLDER).count();

        if slots != 1 {
            return Err(Error::Configuration(format!(
                "ldap.username_lookup must contain exactly one {} placeholder, found {}",
                Self::PLACEHOLDER,
                slots
            )));
        }

        let (prefix, suffix) = template
            .split_once(Self::PLACEHOLDER)
            .or_else(|| template.split_once(Self::LEGACY_PLACEHOLDER))
            .ok_or_else(|| Error::Configuration("ldap.username_lookup has no placeholder".into()))?;

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Build the search filter for `username`
    pub fn render(&self, username: &str) -> String {
        format!("{}{}{}", self.prefix, ldap3::ldap_escape(username), self.suffix)
    }
}

// ============================================================================
// Failure causes
// ============================================================================

/// Step of the bind/search/bind exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolStep {
    Connect,
    ServiceBind,
    Search,
    UserBind,
}

impl fmt::Display for ProtocolStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::ServiceBind => "service bind",
            Self::Search => "user search",
            Self::UserBind => "user bind",
        })
    }
}

/// Why an LDAP authentication attempt failed.
///
/// Only ever logged. Callers see [`Error::InvalidCredentials`] or
/// [`Error::BackendUnavailable`].
#[derive(Debug, Error)]
pub enum LdapFailure {
    #[error("{step} failed: {source}")]
    Directory {
        step: ProtocolStep,
        #[source]
        source: DirectoryError,
    },

    #[error("service account bind rejected with code {rc}; check ldap.bind_dn and ldap.bind_password")]
    ServiceBindRejected { rc: u32 },

    #[error("no directory entry matched the username")]
    UserNotFound,

    #[error("{count} directory entries matched the username")]
    AmbiguousUser { count: usize },

    #[error("user bind rejected with code {rc}")]
    UserBindRejected { rc: u32 },

    #[error("empty username or password")]
    EmptyCredentials,
}

impl LdapFailure {
    /// Failures caused by what the user typed rather than by the backend
    pub fn is_credential_rejection(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound
                | Self::AmbiguousUser { .. }
                | Self::UserBindRejected { .. }
                | Self::EmptyCredentials
        )
    }
}

impl From<LdapFailure> for Error {
    fn from(failure: LdapFailure) -> Self {
        if failure.is_credential_rejection() {
            Error::InvalidCredentials
        } else {
            Error::BackendUnavailable("directory server unavailable".into())
        }
    }
}
