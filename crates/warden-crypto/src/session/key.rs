//! Session keyring

use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::CodecError;

/// Length of a session key in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// The single active key used to seal and open session tokens.
///
/// Replacing it invalidates every token issued under the previous key.
#[derive(Clone)]
pub struct SessionKey {
    bytes: [u8; KEY_LEN],
}

impl SessionKey {
    /// Create from raw key material (must be 32 bytes)
    pub fn new(key: &[u8]) -> Result<Self, CodecError> {
        if key.len() != KEY_LEN {
            return Err(CodecError::InvalidKey(
                "Session key must be 32 bytes (256 bits)".into(),
            ));
        }

        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(key);
        Ok(Self { bytes })
    }

    /// Create from a 64-character hex string
    pub fn from_hex(hex_key: &str) -> Result<Self, CodecError> {
        let key = hex::decode(hex_key)
            .map_err(|e| CodecError::InvalidKey(format!("Invalid hex: {}", e)))?;
        Self::new(&key)
    }

    /// Create from passphrase (derives key using SHA-256)
    pub fn from_passphrase(passphrase: &str) -> Result<Self, CodecError> {
        if passphrase.is_empty() {
            return Err(CodecError::InvalidKey("Passphrase must not be empty".into()));
        }

        let mut hasher = Sha256::new();
        hasher.update(passphrase.as_bytes());
        Self::new(&hasher.finalize())
    }

    /// Interpret a configured cookie secret.
    ///
    /// 64 hex characters are taken as the raw key, anything else is a
    /// passphrase.
    pub fn from_secret(secret: &str) -> Result<Self, CodecError> {
        let secret = secret.trim();
        if secret.len() == KEY_LEN * 2 && secret.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Self::from_hex(secret);
        }
        Self::from_passphrase(secret)
    }

    /// Generate a new random key
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_length() {
        assert!(SessionKey::new(&[0u8; 32]).is_ok());
        assert!(matches!(
            SessionKey::new(&[0u8; 16]),
            Err(CodecError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_from_secret_hex_and_passphrase() {
        let generated = SessionKey::generate();
        let hex_secret = generated.to_hex();
        assert_eq!(hex_secret.len(), 64);

        let parsed = SessionKey::from_secret(&hex_secret).unwrap();
        assert_eq!(parsed.as_bytes(), generated.as_bytes());

        let a = SessionKey::from_secret("correct horse battery staple").unwrap();
        let b = SessionKey::from_passphrase("correct horse battery staple").unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());

        assert!(SessionKey::from_secret("   ").is_err());
    }

    #[test]
    fn test_generate_is_random() {
        assert_ne!(SessionKey::generate().to_hex(), SessionKey::generate().to_hex());
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = SessionKey::from_hex(&"ab".repeat(32)).unwrap();
        assert_eq!(format!("{:?}", key), "SessionKey(<redacted>)");
    }
}
