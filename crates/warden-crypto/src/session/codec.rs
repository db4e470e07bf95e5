//! Session codec
//!
//! Seals a serializable value into an opaque, authenticated token and opens
//! it again. Any modification of a token (one flipped byte, a different key,
//! a different token name) is reported as [`CodecError::Integrity`].

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::key::SessionKey;
use crate::error::CodecError;

/// Current token format version
pub const TOKEN_VERSION: u8 = 1;

/// Largest token that fits in a browser cookie
pub const MAX_TOKEN_LEN: usize = 4096;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Plaintext wrapper carrying expiry metadata
#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    /// Issued at (Unix timestamp)
    iat: i64,
    /// Expiration (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
    data: T,
}

/// Authenticated-encryption codec for session tokens
pub struct SessionCodec {
    cipher: Aes256Gcm,
    max_age: Option<u64>,
}

impl SessionCodec {
    /// Create a codec whose tokens never expire
    pub fn new(key: &SessionKey) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
        Self {
            cipher: Aes256Gcm::new(key),
            max_age: None,
        }
    }

    /// Expire tokens `seconds` after they are sealed (`None` disables expiry)
    pub fn with_max_age(mut self, seconds: Option<u64>) -> Self {
        self.max_age = seconds;
        self
    }

    pub fn max_age(&self) -> Option<u64> {
        self.max_age
    }

    /// Expiry timestamp for a token sealed at `now`
    fn expiry(&self, now: DateTime<Utc>) -> Result<Option<i64>, CodecError> {
        let Some(seconds) = self.max_age else {
            return Ok(None);
        };

        i64::try_from(seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|age| now.checked_add_signed(age))
            .map(|exp| Some(exp.timestamp()))
            .ok_or_else(|| {
                CodecError::Encoding(format!("max age of {} seconds is out of range", seconds))
            })
    }

    /// Seal `value` into a token bound to `name`
    pub fn seal<T: Serialize>(&self, name: &str, value: &T) -> Result<String, CodecError> {
        self.seal_at(name, value, Utc::now())
    }

    /// Open a token bound to `name`
    pub fn open<T: DeserializeOwned>(&self, name: &str, token: &str) -> Result<T, CodecError> {
        self.open_at(name, token, Utc::now())
    }

    pub fn seal_at<T: Serialize>(
        &self,
        name: &str,
        value: &T,
        now: DateTime<Utc>,
    ) -> Result<String, CodecError> {
        let envelope = Envelope {
            iat: now.timestamp(),
            exp: self.expiry(now)?,
            data: value,
        };

        let plaintext =
            serde_json::to_vec(&envelope).map_err(|e| CodecError::Encoding(e.to_string()))?;

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: &plaintext,
                    aad: name.as_bytes(),
                },
            )
            .map_err(|e| CodecError::Encoding(e.to_string()))?;

        let mut raw = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        raw.push(TOKEN_VERSION);
        raw.extend_from_slice(nonce.as_slice());
        raw.extend_from_slice(&ciphertext);

        let token = URL_SAFE_NO_PAD.encode(raw);
        if token.len() > MAX_TOKEN_LEN {
            return Err(CodecError::Encoding(format!(
                "token is {} bytes, limit is {}",
                token.len(),
                MAX_TOKEN_LEN
            )));
        }

        Ok(token)
    }

    pub fn open_at<T: DeserializeOwned>(
        &self,
        name: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<T, CodecError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(CodecError::Integrity);
        }

        let raw = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|_| CodecError::Integrity)?;

        if raw.len() < 1 + NONCE_LEN + TAG_LEN || raw[0] != TOKEN_VERSION {
            return Err(CodecError::Integrity);
        }

        let (nonce, ciphertext) = raw[1..].split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: name.as_bytes(),
                },
            )
            .map_err(|_| CodecError::Integrity)?;

        let envelope: Envelope<serde_json::Value> = serde_json::from_slice(&plaintext)
            .map_err(|e| CodecError::Malformed(e.to_string()))?;

        if let Some(exp) = envelope.exp {
            if now.timestamp() >= exp {
                return Err(CodecError::Expired);
            }
        }

        serde_json::from_value(envelope.data).map_err(|e| CodecError::Malformed(e.to_string()))
    }
}
