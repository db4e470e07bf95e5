//! Directory connection seam
//!
//! [`LdapAuthenticator`](super::LdapAuthenticator) only needs four operations
//! from a directory server. They sit behind [`DirectoryConnector`] so the
//! protocol can run against an in-memory directory in tests.

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::LdapSettings;

/// Transport-level directory failure
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error("deadline exceeded")]
    Timeout,

    #[error("{0}")]
    Transport(String),
}

impl From<ldap3::LdapError> for DirectoryError {
    fn from(err: ldap3::LdapError) -> Self {
        DirectoryError::Transport(err.to_string())
    }
}

/// Result of a simple bind that reached the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    Bound,
    /// Server answered with a non-zero result code (49 = invalid credentials)
    Rejected { rc: u32 },
}

impl BindOutcome {
    pub fn from_rc(rc: u32) -> Self {
        if rc == 0 {
            BindOutcome::Bound
        } else {
            BindOutcome::Rejected { rc }
        }
    }
}

/// Opens connections to a directory server
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn DirectoryConnection>, DirectoryError>;
}

/// One open directory connection
#[async_trait]
pub trait DirectoryConnection: Send {
    async fn simple_bind(&mut self, dn: &str, password: &str)
        -> Result<BindOutcome, DirectoryError>;

    /// Subtree search under `base`, returning the DN of every matching entry
    async fn search_subtree(&mut self, base: &str, filter: &str)
        -> Result<Vec<String>, DirectoryError>;

    async fn close(&mut self) -> Result<(), DirectoryError>;
}

// ============================================================================
// ldap3 implementation
// ============================================================================

/// Connector backed by the `ldap3` client
#[derive(Debug, Clone)]
pub struct Ldap3Connector {
    url: String,
    start_tls: bool,
    timeout: Duration,
}

impl Ldap3Connector {
    pub fn new(settings: &LdapSettings) -> Self {
        Self {
            url: settings.url.clone(),
            start_tls: settings.start_tls,
            timeout: settings.timeout,
        }
    }
}

#[async_trait]
impl DirectoryConnector for Ldap3Connector {
    async fn connect(&self) -> Result<Box<dyn DirectoryConnection>, DirectoryError> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.timeout)
            .set_starttls(self.start_tls);

        debug!("Connecting to LDAP server: {}", self.url);

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.url).await?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!("LDAP connection error: {}", e);
            }
        });

        Ok(Box::new(Ldap3Connection {
            ldap,
            timeout: self.timeout,
        }))
    }
}

struct Ldap3Connection {
    ldap: Ldap,
    timeout: Duration,
}

#[async_trait]
impl DirectoryConnection for Ldap3Connection {
    async fn simple_bind(
        &mut self,
        dn: &str,
        password: &str,
    ) -> Result<BindOutcome, DirectoryError> {
        let result = self
            .ldap
            .with_timeout(self.timeout)
            .simple_bind(dn, password)
            .await?;

        Ok(BindOutcome::from_rc(result.rc))
    }

    async fn search_subtree(
        &mut self,
        base: &str,
        filter: &str,
    ) -> Result<Vec<String>, DirectoryError> {
        // "1.1" requests no attributes; only the DN is needed
        let (entries, _res) = self
            .ldap
            .with_timeout(self.timeout)
            .search(base, Scope::Subtree, filter, vec!["1.1"])
            .await?
            .success()?;

        Ok(entries
            .into_iter()
            .filter(|entry| !entry.is_ref() && !entry.is_intermediate())
            .map(|entry| SearchEntry::construct(entry).dn)
            .collect())
    }

    async fn close(&mut self) -> Result<(), DirectoryError> {
        self.ldap.unbind().await?;
        Ok(())
    }
}
