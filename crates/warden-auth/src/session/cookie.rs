//! Cookie-backed session store

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use http::header::SET_COOKIE;
use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;
use warden_core::config::{SameSitePolicy, SessionConfig};
use warden_core::{Error, Identity, Result};
use warden_crypto::{CodecError, SessionCodec, SessionKey};

use super::{SessionPayload, SessionStore};

/// Keeps the session in a sealed cookie on the client
pub struct CookieSessionStore {
    codec: SessionCodec,
    cookie_name: String,
    cookie_path: String,
    secure: bool,
    same_site: SameSite,
    max_age: Option<u64>,
}

impl CookieSessionStore {
    /// Build a store with an explicit key; `config.cookie_secret` is ignored
    pub fn new(key: &SessionKey, config: &SessionConfig) -> Result<Self> {
        if !is_cookie_token(&config.cookie_name) {
            return Err(Error::Configuration(format!(
                "session.cookie_name {:?} is not a valid cookie name",
                config.cookie_name
            )));
        }
        if config.same_site == SameSitePolicy::None && !config.secure {
            return Err(Error::Configuration(
                "session.same_site = \"none\" requires session.secure = true".into(),
            ));
        }
        if config.max_age_seconds > warden_core::MAX_SESSION_MAX_AGE_SECS {
            return Err(Error::Configuration(format!(
                "session.max_age_seconds must not exceed {}",
                warden_core::MAX_SESSION_MAX_AGE_SECS
            )));
        }

        Ok(Self {
            codec: SessionCodec::new(key).with_max_age(config.max_age()),
            cookie_name: config.cookie_name.clone(),
            cookie_path: config.cookie_path.clone(),
            secure: config.secure,
            same_site: match config.same_site {
                SameSitePolicy::Lax => SameSite::Lax,
                SameSitePolicy::Strict => SameSite::Strict,
                SameSitePolicy::None => SameSite::None,
            },
            max_age: config.max_age(),
        })
    }

    /// Build a store keyed by `config.cookie_secret`
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        let key = SessionKey::from_secret(&config.cookie_secret)
            .map_err(|e| Error::Configuration(format!("session.cookie_secret: {}", e)))?;
        Self::new(&key, config)
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Open a token and report exactly why it was refused.
    ///
    /// Unlike [`SessionStore::retrieve_identity_from_token`], integrity and
    /// expiry failures come back as [`Error::SessionIntegrity`] and
    /// [`Error::SessionExpired`].
    pub fn open_token(&self, token: &str) -> Result<Option<Identity>> {
        let payload: SessionPayload = self
            .codec
            .open(&self.cookie_name, token)
            .map_err(codec_error)?;
        Ok(payload.user)
    }

    fn decode(&self, token: &str) -> Result<Option<Identity>> {
        match self.open_token(token) {
            Err(e @ (Error::SessionIntegrity | Error::SessionExpired)) => {
                debug!("Ignoring session token: {}", e);
                Ok(None)
            }
            other => other,
        }
    }

    fn append_cookie(&self, response: &mut HeaderMap, cookie: Cookie<'_>) -> Result<()> {
        let value = HeaderValue::from_str(&cookie.to_string())
            .map_err(|e| Error::Persistence(e.to_string()))?;
        response.append(SET_COOKIE, value);
        Ok(())
    }
}

impl SessionStore for CookieSessionStore {
    fn store_identity(&self, response: &mut HeaderMap, identity: &Identity) -> Result<()> {
        let token = self.issue_token(identity)?;

        let mut cookie = Cookie::build((self.cookie_name.clone(), token))
            .path(self.cookie_path.clone())
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .build();

        if let Some(seconds) = self.max_age {
            let seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
            cookie.set_max_age(time::Duration::seconds(seconds));
        }

        self.append_cookie(response, cookie)?;
        debug!("Stored session for user: {}", identity);
        Ok(())
    }

    fn retrieve_identity(&self, request: &HeaderMap) -> Result<Option<Identity>> {
        let jar = CookieJar::from_headers(request);
        match jar.get(&self.cookie_name) {
            Some(cookie) => self.decode(cookie.value()),
            None => Ok(None),
        }
    }

    fn retrieve_identity_from_token(&self, token: &str) -> Result<Option<Identity>> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        self.decode(token)
    }

    fn forget_identity(&self, response: &mut HeaderMap) -> Result<()> {
        let cookie = Cookie::build((self.cookie_name.clone(), ""))
            .path(self.cookie_path.clone())
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .max_age(time::Duration::ZERO)
            .expires(time::OffsetDateTime::UNIX_EPOCH)
            .build();

        self.append_cookie(response, cookie)
    }

    fn issue_token(&self, identity: &Identity) -> Result<String> {
        self.codec
            .seal(&self.cookie_name, &SessionPayload::for_user(identity))
            .map_err(codec_error)
    }
}

fn codec_error(err: CodecError) -> Error {
    match err {
        CodecError::Integrity => Error::SessionIntegrity,
        CodecError::Expired => Error::SessionExpired,
        CodecError::Malformed(msg) => Error::MalformedSession(msg),
        CodecError::Encoding(msg) | CodecError::InvalidKey(msg) => Error::Encoding(msg),
    }
}

/// A cookie-name is an HTTP token, the same grammar as a header field name
fn is_cookie_token(name: &str) -> bool {
    HeaderName::from_bytes(name.as_bytes()).is_ok()
}
