//! Configuration for Warden
//!
//! Loaded from a TOML file and then overridden from environment variables:
//!
//! ```toml
//! [auth]
//! type = "ldap"
//!
//! [session]
//! cookie_name = "warden_session"
//! cookie_secret = "0123...64 hex chars or any passphrase"
//!
//! [ldap]
//! host = "ldap.example.com"
//! port = 389
//! bind_dn = "cn=reader,dc=example,dc=com"
//! bind_password = "secret"
//! base_dn = "ou=people,dc=example,dc=com"
//! username_lookup = "(uid={username})"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub dummy: DummyConfig,

    #[serde(default)]
    pub ldap: LdapConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WardenConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        debug!("Loading configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Load from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(env_prefix)?;
        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Override fields from process environment variables.
    ///
    /// With a non-empty `prefix` every variable is looked up as
    /// `<PREFIX>_<NAME>`, e.g. `MYAPP_LDAP_HOST`.
    pub fn apply_env(&mut self, prefix: &str) -> Result<()> {
        self.apply_env_with(prefix, |name| std::env::var(name).ok())
    }

    /// Same as [`apply_env`](Self::apply_env) with a caller-supplied lookup.
    pub fn apply_env_with<F>(&mut self, prefix: &str, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvSource { prefix, lookup };

        env.string("AUTH_TYPE", &mut self.auth.kind);
        env.string("AUTH_DUMMY_PASSWORD", &mut self.dummy.password);
        env.string("AUTH_COOKIE_SECRET", &mut self.session.cookie_secret);
        env.string("AUTH_COOKIE_NAME", &mut self.session.cookie_name);

        env.string("LDAP_HOST", &mut self.ldap.host);
        env.number("LDAP_PORT", &mut self.ldap.port)?;
        env.string("LDAP_BIND_DN", &mut self.ldap.bind_dn);
        env.string("LDAP_BIND_PASSWORD", &mut self.ldap.bind_password);
        env.string("LDAP_BASE_DN", &mut self.ldap.base_dn);
        env.string("LDAP_USERNAME_LOOKUP", &mut self.ldap.username_lookup);
        env.number("LDAP_TIMEOUT_SECONDS", &mut self.ldap.timeout_seconds)?;

        Ok(())
    }

    /// Check that the sections required by the selected authenticator are set.
    pub fn validate(&self) -> Result<()> {
        let kind = self.auth.kind()?;
        self.session.validate()?;

        match kind {
            AuthenticatorKind::Dummy => self.dummy.validate(),
            AuthenticatorKind::Ldap => self.ldap.validate(),
        }
    }
}

struct EnvSource<'a, F> {
    prefix: &'a str,
    lookup: F,
}

impl<F> EnvSource<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn key(&self, name: &str) -> String {
        let prefix = self.prefix.trim_end_matches('_');
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}_{}", prefix.to_uppercase(), name)
        }
    }

    fn get(&self, name: &str) -> Option<(String, String)> {
        let key = self.key(name);
        (self.lookup)(&key)
            .filter(|value| !value.is_empty())
            .map(|value| (key, value))
    }

    fn string(&self, name: &str, field: &mut String) {
        if let Some((_, value)) = self.get(name) {
            *field = value;
        }
    }

    fn number<T: FromStr>(&self, name: &str, field: &mut T) -> Result<()> {
        if let Some((key, value)) = self.get(name) {
            *field = value.trim().parse().map_err(|_| {
                Error::Configuration(format!("{} is not a valid number: {:?}", key, value))
            })?;
        }
        Ok(())
    }
}

// ============================================================================
// Authenticator selection
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Authenticator backend: "dummy" or "ldap"
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl AuthConfig {
    pub fn kind(&self) -> Result<AuthenticatorKind> {
        self.kind.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticatorKind {
    /// One shared password for every username
    Dummy,
    /// Directory bind/search/bind
    Ldap,
}

impl AuthenticatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dummy => "dummy",
            Self::Ldap => "ldap",
        }
    }
}

impl FromStr for AuthenticatorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dummy" => Ok(Self::Dummy),
            "ldap" => Ok(Self::Ldap),
            "" => Err(Error::Configuration(
                "auth.type is not set (expected \"dummy\" or \"ldap\")".into(),
            )),
            other => Err(Error::Configuration(format!(
                "Unknown authenticate service type: {}",
                other
            ))),
        }
    }
}

// ============================================================================
// Session cookie
// ============================================================================

#[derive(Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// 64 hex characters (raw 256-bit key) or a passphrase
    #[serde(default)]
    pub cookie_secret: String,

    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,

    /// Session lifetime; 0 disables expiry
    #[serde(default = "default_max_age")]
    pub max_age_seconds: u64,

    /// Set the Secure cookie attribute
    #[serde(default = "default_true")]
    pub secure: bool,

    #[serde(default)]
    pub same_site: SameSitePolicy,
}

fn default_cookie_name() -> String {
    crate::DEFAULT_COOKIE_NAME.to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_max_age() -> u64 {
    crate::DEFAULT_SESSION_MAX_AGE_SECS
}

fn default_true() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_secret: String::new(),
            cookie_path: default_cookie_path(),
            max_age_seconds: default_max_age(),
            secure: true,
            same_site: SameSitePolicy::default(),
        }
    }
}

impl SessionConfig {
    /// Session lifetime in seconds, `None` when sessions never expire
    pub fn max_age(&self) -> Option<u64> {
        (self.max_age_seconds > 0).then_some(self.max_age_seconds)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cookie_secret.is_empty() {
            return Err(Error::Configuration("session.cookie_secret is required".into()));
        }
        if self.cookie_name.is_empty() {
            return Err(Error::Configuration("session.cookie_name must not be empty".into()));
        }
        if self.max_age_seconds > crate::MAX_SESSION_MAX_AGE_SECS {
            return Err(Error::Configuration(format!(
                "session.max_age_seconds must not exceed {}",
                crate::MAX_SESSION_MAX_AGE_SECS
            )));
        }
        if self.same_site == SameSitePolicy::None && !self.secure {
            return Err(Error::Configuration(
                "session.same_site = \"none\" requires session.secure = true".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie_name", &self.cookie_name)
            .field("cookie_secret", &"<redacted>")
            .field("cookie_path", &self.cookie_path)
            .field("max_age_seconds", &self.max_age_seconds)
            .field("secure", &self.secure)
            .field("same_site", &self.same_site)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    #[default]
    Lax,
    Strict,
    None,
}

// ============================================================================
// Dummy authenticator
// ============================================================================

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct DummyConfig {
    /// Password accepted for every username
    #[serde(default)]
    pub password: String,
}

impl DummyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.password.is_empty() {
            return Err(Error::Configuration("dummy.password is required".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for DummyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyConfig")
            .field("password", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// LDAP authenticator
// ============================================================================

#[derive(Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    #[serde(default)]
    pub host: String,

    #[serde(default = "default_ldap_port")]
    pub port: u16,

    /// Service account used for the user lookup
    /// Example: "cn=reader,dc=example,dc=com"
    #[serde(default)]
    pub bind_dn: String,

    #[serde(default)]
    pub bind_password: String,

    /// Base DN for the user search
    /// Example: "ou=people,dc=example,dc=com"
    #[serde(default)]
    pub base_dn: String,

    /// Search filter with one `{username}` (or `%s`) placeholder
    /// Example: "(uid={username})"
    #[serde(default = "default_username_lookup")]
    pub username_lookup: String,

    /// Deadline for each directory step (connect, bind, search)
    #[serde(default = "default_ldap_timeout")]
    pub timeout_seconds: u64,

    /// Upgrade plain connections with STARTTLS
    #[serde(default)]
    pub start_tls: bool,

    /// Connect with ldaps:// instead of ldap://
    #[serde(default)]
    pub use_ldaps: bool,
}

fn default_ldap_port() -> u16 {
    crate::DEFAULT_LDAP_PORT
}

fn default_username_lookup() -> String {
    "(uid={username})".to_string()
}

fn default_ldap_timeout() -> u64 {
    crate::DEFAULT_LDAP_TIMEOUT_SECS
}

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_ldap_port(),
            bind_dn: String::new(),
            bind_password: String::new(),
            base_dn: String::new(),
            username_lookup: default_username_lookup(),
            timeout_seconds: default_ldap_timeout(),
            start_tls: false,
            use_ldaps: false,
        }
    }
}

impl LdapConfig {
    /// Server URL built from host and port
    pub fn url(&self) -> String {
        let scheme = if self.use_ldaps { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::Configuration("ldap.host is required".into()));
        }
        if self.port == 0 {
            return Err(Error::Configuration("ldap.port must not be 0".into()));
        }
        if self.base_dn.is_empty() {
            return Err(Error::Configuration("ldap.base_dn is required".into()));
        }
        if self.username_lookup.is_empty() {
            return Err(Error::Configuration("ldap.username_lookup is required".into()));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::Configuration("ldap.timeout_seconds must not be 0".into()));
        }
        if self.use_ldaps && self.start_tls {
            return Err(Error::Configuration(
                "ldap.start_tls cannot be combined with ldap.use_ldaps".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LdapConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &"<redacted>")
            .field("base_dn", &self.base_dn)
            .field("username_lookup", &self.username_lookup)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("start_tls", &self.start_tls)
            .field("use_ldaps", &self.use_ldaps)
            .finish()
    }
}

// ============================================================================
// Server & logging
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WardenConfig::default();
        assert_eq!(config.session.cookie_name, "warden_session");
        assert_eq!(config.session.max_age(), Some(30 * 24 * 60 * 60));
        assert!(config.session.secure);
        assert_eq!(config.ldap.port, 389);
        assert_eq!(config.ldap.username_lookup, "(uid={username})");
        assert_eq!(config.ldap.url(), "ldap://:389");
    }

    #[test]
    fn test_parse_toml() {
        let config = WardenConfig::from_toml_str(
            r#"
            [auth]
            type = "ldap"

            [session]
            cookie_secret = "s3cret"
            same_site = "strict"
            max_age_seconds = 0

            [ldap]
            host = "ldap.example.com"
            port = 636
            use_ldaps = true
            base_dn = "ou=people,dc=example,dc=com"
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.kind().unwrap(), AuthenticatorKind::Ldap);
        assert_eq!(config.session.same_site, SameSitePolicy::Strict);
        assert_eq!(config.session.max_age(), None);
        assert_eq!(config.ldap.url(), "ldaps://ldap.example.com:636");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[auth]\ntype = \"dummy\"\n[dummy]\npassword = \"pw\"").unwrap();

        let config = WardenConfig::from_file(file.path()).unwrap();
        assert_eq!(config.auth.kind, "dummy");
        assert_eq!(config.dummy.password, "pw");

        assert!(matches!(
            WardenConfig::from_file("/nonexistent/warden.toml"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = WardenConfig::default();
        config.ldap.host = "from-file".to_string();

        config
            .apply_env_with(
                "",
                lookup(&[
                    ("AUTH_TYPE", "ldap"),
                    ("LDAP_PORT", "1389"),
                    ("LDAP_HOST", ""),
                    ("LDAP_BASE_DN", "dc=example,dc=com"),
                ]),
            )
            .unwrap();

        assert_eq!(config.auth.kind, "ldap");
        assert_eq!(config.ldap.port, 1389);
        // Empty values leave the existing value alone
        assert_eq!(config.ldap.host, "from-file");
        assert_eq!(config.ldap.base_dn, "dc=example,dc=com");
    }

    #[test]
    fn test_env_prefix() {
        let mut config = WardenConfig::default();
        config
            .apply_env_with(
                "myapp_",
                lookup(&[
                    ("MYAPP_AUTH_COOKIE_SECRET", "prefixed"),
                    ("AUTH_COOKIE_SECRET", "unprefixed"),
                ]),
            )
            .unwrap();

        assert_eq!(config.session.cookie_secret, "prefixed");
    }

    #[test]
    fn test_env_invalid_number() {
        let mut config = WardenConfig::default();
        let result = config.apply_env_with("", lookup(&[("LDAP_PORT", "not-a-port")]));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_authenticator_kind() {
        assert_eq!("dummy".parse::<AuthenticatorKind>().unwrap(), AuthenticatorKind::Dummy);
        assert_eq!(" LDAP ".parse::<AuthenticatorKind>().unwrap(), AuthenticatorKind::Ldap);
        assert!(matches!(
            "kerberos".parse::<AuthenticatorKind>(),
            Err(Error::Configuration(_))
        ));
        assert!("".parse::<AuthenticatorKind>().is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = WardenConfig::default();
        config.auth.kind = "dummy".to_string();

        // No cookie secret
        assert!(config.validate().is_err());

        config.session.cookie_secret = "secret".to_string();
        // No dummy password
        assert!(config.validate().is_err());

        config.dummy.password = "pw".to_string();
        assert!(config.validate().is_ok());

        config.session.max_age_seconds = u64::MAX;
        assert!(config.validate().is_err());
        config.session.max_age_seconds = crate::MAX_SESSION_MAX_AGE_SECS;
        assert!(config.validate().is_ok());

        config.session.secure = false;
        config.session.same_site = SameSitePolicy::None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = WardenConfig::default();
        config.session.cookie_secret = "top-secret-cookie".to_string();
        config.ldap.bind_password = "top-secret-bind".to_string();
        config.dummy.password = "top-secret-dummy".to_string();

        let printed = format!("{:?}", config);
        assert!(!printed.contains("top-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
