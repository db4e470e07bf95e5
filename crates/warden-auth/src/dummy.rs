//! Fixed-password authenticator for development and tests

use async_trait::async_trait;
use tracing::debug;
use warden_core::config::DummyConfig;
use warden_core::{Error, Identity, Result};

use crate::authenticator::Authenticator;

/// Accepts any username paired with one shared password
pub struct DummyAuthenticator {
    password: String,
}

impl DummyAuthenticator {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    pub fn from_config(config: &DummyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.password.clone()))
    }
}

#[async_trait]
impl Authenticator for DummyAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Identity> {
        if username.is_empty() || !constant_time_eq(password.as_bytes(), self.password.as_bytes())
        {
            debug!("Dummy authentication rejected");
            return Err(Error::InvalidCredentials);
        }

        Ok(Identity::new(username))
    }

    fn kind(&self) -> &'static str {
        "dummy"
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_correct_password() {
        let auth = DummyAuthenticator::new("password");
        let identity = auth.authenticate("alice", "password").await.unwrap();
        assert_eq!(identity.user_id(), "alice");
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let auth = DummyAuthenticator::new("password");
        for wrong in ["", "passwor", "password1", "PASSWORD"] {
            assert!(matches!(
                auth.authenticate("alice", wrong).await,
                Err(Error::InvalidCredentials)
            ));
        }
    }

    #[tokio::test]
    async fn test_empty_username() {
        let auth = DummyAuthenticator::new("password");
        assert!(matches!(
            auth.authenticate("", "password").await,
            Err(Error::InvalidCredentials)
        ));
    }

    #[test]
    fn test_from_config_requires_password() {
        assert!(matches!(
            DummyAuthenticator::from_config(&DummyConfig::default()),
            Err(Error::Configuration(_))
        ));
    }
}
