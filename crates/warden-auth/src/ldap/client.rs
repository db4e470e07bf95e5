//! LDAP authenticator

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use warden_core::config::LdapConfig;
use warden_core::{Identity, Result};

use super::directory::{
    BindOutcome, DirectoryConnection, DirectoryConnector, DirectoryError, Ldap3Connector,
};
use super::types::{LdapFailure, LdapSettings, ProtocolStep};
use crate::authenticator::Authenticator;

/// Authenticates users against a directory server.
///
/// Each call opens its own connection and closes it before returning, so
/// concurrent logins never share protocol state.
pub struct LdapAuthenticator {
    settings: LdapSettings,
    connector: Arc<dyn DirectoryConnector>,
}

impl LdapAuthenticator {
    pub fn new(settings: LdapSettings) -> Self {
        let connector = Arc::new(Ldap3Connector::new(&settings));
        Self::with_connector(settings, connector)
    }

    pub fn from_config(config: &LdapConfig) -> Result<Self> {
        Ok(Self::new(LdapSettings::from_config(config)?))
    }

    pub fn with_connector(settings: LdapSettings, connector: Arc<dyn DirectoryConnector>) -> Self {
        Self {
            settings,
            connector,
        }
    }

    pub fn settings(&self) -> &LdapSettings {
        &self.settings
    }

    /// Run the full exchange and report the precise failure cause
    pub async fn verify(
        &self,
        username: &str,
        password: &str,
    ) -> std::result::Result<(), LdapFailure> {
        // An empty password would be an anonymous bind, which most servers accept
        if username.is_empty() || password.is_empty() {
            return Err(LdapFailure::EmptyCredentials);
        }

        let mut conn = self
            .step(ProtocolStep::Connect, self.connector.connect())
            .await?;

        let outcome = self.exchange(conn.as_mut(), username, password).await;

        match timeout(self.settings.timeout, conn.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("LDAP close failed: {}", e),
            Err(_) => debug!("LDAP close timed out"),
        }

        outcome
    }

    async fn exchange(
        &self,
        conn: &mut dyn DirectoryConnection,
        username: &str,
        password: &str,
    ) -> std::result::Result<(), LdapFailure> {
        let service_bind = conn.simple_bind(&self.settings.bind_dn, &self.settings.bind_password);
        if let BindOutcome::Rejected { rc } =
            self.step(ProtocolStep::ServiceBind, service_bind).await?
        {
            return Err(LdapFailure::ServiceBindRejected { rc });
        }

        let filter = self.settings.filter.render(username);
        debug!("Searching for user with filter: {}", filter);

        let mut found = self
            .step(
                ProtocolStep::Search,
                conn.search_subtree(&self.settings.base_dn, &filter),
            )
            .await?;

        let user_dn = match found.len() {
            0 => return Err(LdapFailure::UserNotFound),
            1 => found.remove(0),
            count => return Err(LdapFailure::AmbiguousUser { count }),
        };

        debug!("Found user DN: {}", user_dn);

        match self
            .step(ProtocolStep::UserBind, conn.simple_bind(&user_dn, password))
            .await?
        {
            BindOutcome::Bound => Ok(()),
            BindOutcome::Rejected { rc } => Err(LdapFailure::UserBindRejected { rc }),
        }
    }

    /// Await one protocol step under the configured deadline
    async fn step<T, F>(&self, step: ProtocolStep, fut: F) -> std::result::Result<T, LdapFailure>
    where
        F: Future<Output = std::result::Result<T, DirectoryError>>,
    {
        match timeout(self.settings.timeout, fut).await {
            Ok(result) => result.map_err(|source| LdapFailure::Directory { step, source }),
            Err(_) => Err(LdapFailure::Directory {
                step,
                source: DirectoryError::Timeout,
            }),
        }
    }
}

#[async_trait]
impl Authenticator for LdapAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Identity> {
        match self.verify(username, password).await {
            Ok(()) => {
                info!("LDAP authentication succeeded for user: {}", username);
                Ok(Identity::new(username))
            }
            Err(failure) => {
                match &failure {
                    LdapFailure::ServiceBindRejected { .. } => {
                        error!("LDAP service account bind failed: {}", failure)
                    }
                    f if f.is_credential_rejection() => {
                        debug!("LDAP authentication rejected for user {}: {}", username, f)
                    }
                    f => warn!("LDAP directory unavailable: {}", f),
                }
                Err(failure.into())
            }
        }
    }

    fn kind(&self) -> &'static str {
        "ldap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ldap::FilterTemplate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use warden_core::Error;

    const SERVICE_DN: &str = "cn=reader,dc=example,dc=com";
    const SERVICE_PASSWORD: &str = "reader-secret";

    /// In-memory directory with one password shared by every user entry
    struct FakeDirectory {
        connect_error: bool,
        service_rc: u32,
        search: std::result::Result<Vec<String>, DirectoryError>,
        user_password: String,
        hang_on: Option<ProtocolStep>,
        connects: AtomicUsize,
        closes: AtomicUsize,
        filters: Mutex<Vec<String>>,
        binds: Mutex<Vec<String>>,
    }

    impl FakeDirectory {
        fn with_users(dns: &[&str]) -> Self {
            Self {
                connect_error: false,
                service_rc: 0,
                search: Ok(dns.iter().map(|dn| dn.to_string()).collect()),
                user_password: "hunter2".to_string(),
                hang_on: None,
                connects: AtomicUsize::new(0),
                closes: AtomicUsize::new(0),
                filters: Mutex::new(Vec::new()),
                binds: Mutex::new(Vec::new()),
            }
        }

        fn closes(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }

        fn connects(&self) -> usize {
            self.connects.load(Ordering::SeqCst)
        }
    }

    struct Connector(Arc<FakeDirectory>);

    struct FakeConnection(Arc<FakeDirectory>);

    impl FakeConnection {
        async fn maybe_hang(&self, step: ProtocolStep) {
            if self.0.hang_on == Some(step) {
                std::future::pending::<()>().await;
            }
        }
    }

    #[async_trait]
    impl DirectoryConnector for Connector {
        async fn connect(
            &self,
        ) -> std::result::Result<Box<dyn DirectoryConnection>, DirectoryError> {
            self.0.connects.fetch_add(1, Ordering::SeqCst);
            if self.0.hang_on == Some(ProtocolStep::Connect) {
                std::future::pending::<()>().await;
            }
            if self.0.connect_error {
                return Err(DirectoryError::Transport("connection refused".into()));
            }
            Ok(Box::new(FakeConnection(self.0.clone())))
        }
    }

    #[async_trait]
    impl DirectoryConnection for FakeConnection {
        async fn simple_bind(
            &mut self,
            dn: &str,
            password: &str,
        ) -> std::result::Result<BindOutcome, DirectoryError> {
            self.0.binds.lock().unwrap().push(dn.to_string());

            if dn == SERVICE_DN {
                self.maybe_hang(ProtocolStep::ServiceBind).await;
                if self.0.service_rc != 0 {
                    return Ok(BindOutcome::Rejected {
                        rc: self.0.service_rc,
                    });
                }
                return Ok(BindOutcome::from_rc(if password == SERVICE_PASSWORD {
                    0
                } else {
                    49
                }));
            }

            self.maybe_hang(ProtocolStep::UserBind).await;
            Ok(BindOutcome::from_rc(if password == self.0.user_password {
                0
            } else {
                49
            }))
        }

        async fn search_subtree(
            &mut self,
            _base: &str,
            filter: &str,
        ) -> std::result::Result<Vec<String>, DirectoryError> {
            self.0.filters.lock().unwrap().push(filter.to_string());
            self.maybe_hang(ProtocolStep::Search).await;
            self.0.search.clone()
        }

        async fn close(&mut self) -> std::result::Result<(), DirectoryError> {
            self.0.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn authenticator(directory: &Arc<FakeDirectory>) -> LdapAuthenticator {
        let settings = LdapSettings {
            url: "ldap://ldap.example.com:389".to_string(),
            start_tls: false,
            bind_dn: SERVICE_DN.to_string(),
            bind_password: SERVICE_PASSWORD.to_string(),
            base_dn: "ou=people,dc=example,dc=com".to_string(),
            filter: FilterTemplate::parse("(uid={username})").unwrap(),
            timeout: Duration::from_secs(5),
        };
        LdapAuthenticator::with_connector(settings, Arc::new(Connector(directory.clone())))
    }

    #[tokio::test]
    async fn test_successful_login() {
        let directory = Arc::new(FakeDirectory::with_users(&[
            "uid=john,ou=people,dc=example,dc=com",
        ]));
        let auth = authenticator(&directory);

        let identity = auth.authenticate("john", "hunter2").await.unwrap();
        assert_eq!(identity.user_id(), "john");
        assert_eq!(directory.closes(), 1);
        assert_eq!(
            *directory.binds.lock().unwrap(),
            vec![
                SERVICE_DN.to_string(),
                "uid=john,ou=people,dc=example,dc=com".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let directory = Arc::new(FakeDirectory::with_users(&[
            "uid=john,ou=people,dc=example,dc=com",
        ]));
        let auth = authenticator(&directory);

        assert!(matches!(
            auth.verify("john", "wrong").await,
            Err(LdapFailure::UserBindRejected { rc: 49 })
        ));
        assert!(matches!(
            auth.authenticate("john", "wrong").await,
            Err(Error::InvalidCredentials)
        ));
        assert_eq!(directory.closes(), 2);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let directory = Arc::new(FakeDirectory::with_users(&[]));
        let auth = authenticator(&directory);

        assert!(matches!(
            auth.verify("nobody", "hunter2").await,
            Err(LdapFailure::UserNotFound)
        ));
        assert_eq!(directory.closes(), 1);
        assert_eq!(directory.binds.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ambiguous_user() {
        let directory = Arc::new(FakeDirectory::with_users(&[
            "uid=john,ou=people,dc=example,dc=com",
            "uid=john,ou=contractors,dc=example,dc=com",
        ]));
        let auth = authenticator(&directory);

        assert!(matches!(
            auth.verify("john", "hunter2").await,
            Err(LdapFailure::AmbiguousUser { count: 2 })
        ));
        assert!(matches!(
            auth.authenticate("john", "hunter2").await,
            Err(Error::InvalidCredentials)
        ));
        assert_eq!(directory.closes(), 2);
    }

    #[tokio::test]
    async fn test_service_bind_rejected() {
        let mut directory = FakeDirectory::with_users(&["uid=john,ou=people,dc=example,dc=com"]);
        directory.service_rc = 49;
        let directory = Arc::new(directory);
        let auth = authenticator(&directory);

        assert!(matches!(
            auth.verify("john", "hunter2").await,
            Err(LdapFailure::ServiceBindRejected { rc: 49 })
        ));
        assert!(matches!(
            auth.authenticate("john", "hunter2").await,
            Err(Error::BackendUnavailable(_))
        ));
        assert_eq!(directory.closes(), 2);
        assert!(directory.filters.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connect_failure_skips_close() {
        let mut directory = FakeDirectory::with_users(&[]);
        directory.connect_error = true;
        let directory = Arc::new(directory);
        let auth = authenticator(&directory);

        assert!(matches!(
            auth.authenticate("john", "hunter2").await,
            Err(Error::BackendUnavailable(_))
        ));
        assert_eq!(directory.connects(), 1);
        assert_eq!(directory.closes(), 0);
    }

    #[tokio::test]
    async fn test_search_failure() {
        let mut directory = FakeDirectory::with_users(&[]);
        directory.search = Err(DirectoryError::Transport("noSuchObject".into()));
        let directory = Arc::new(directory);
        let auth = authenticator(&directory);

        assert!(matches!(
            auth.verify("john", "hunter2").await,
            Err(LdapFailure::Directory {
                step: ProtocolStep::Search,
                ..
            })
        ));
        assert_eq!(directory.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_step_times_out() {
        for step in [
            ProtocolStep::Connect,
            ProtocolStep::ServiceBind,
            ProtocolStep::Search,
            ProtocolStep::UserBind,
        ] {
            let mut directory =
                FakeDirectory::with_users(&["uid=john,ou=people,dc=example,dc=com"]);
            directory.hang_on = Some(step);
            let directory = Arc::new(directory);
            let auth = authenticator(&directory);

            match auth.verify("john", "hunter2").await {
                Err(LdapFailure::Directory {
                    step: failed,
                    source: DirectoryError::Timeout,
                }) => assert_eq!(failed, step),
                other => panic!("{} did not time out: {:?}", step, other),
            }

            let expected_closes = if step == ProtocolStep::Connect { 0 } else { 1 };
            assert_eq!(directory.closes(), expected_closes);
        }
    }

    #[tokio::test]
    async fn test_empty_credentials_skip_directory() {
        let directory = Arc::new(FakeDirectory::with_users(&[
            "uid=john,ou=people,dc=example,dc=com",
        ]));
        let auth = authenticator(&directory);

        for (user, pass) in [("john", ""), ("", "hunter2"), ("", "")] {
            assert!(matches!(
                auth.authenticate(user, pass).await,
                Err(Error::InvalidCredentials)
            ));
        }
        assert_eq!(directory.connects(), 0);
    }

    #[tokio::test]
    async fn test_username_is_escaped_in_filter() {
        let directory = Arc::new(FakeDirectory::with_users(&[]));
        let auth = authenticator(&directory);

        let _ = auth.authenticate("*)(uid=*", "hunter2").await;
        assert_eq!(
            *directory.filters.lock().unwrap(),
            vec![r"(uid=\2a\29\28uid=\2a)".to_string()]
        );
    }
}
