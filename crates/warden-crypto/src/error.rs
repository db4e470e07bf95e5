//! Session codec errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Encoding failed: {0}")]
    Encoding(String),

    /// Tampering, wrong key, wrong token name or corruption
    #[error("Token failed integrity check")]
    Integrity,

    #[error("Token has expired")]
    Expired,

    /// Authentic token whose payload does not have the expected shape
    #[error("Malformed token payload: {0}")]
    Malformed(String),
}
