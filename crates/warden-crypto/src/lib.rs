//! Cryptography utilities for Warden
//!
//! Sealed session tokens: AES-256-GCM over a JSON envelope, keyed by a
//! single process-wide [`SessionKey`].

pub mod error;
pub mod session;

pub use error::CodecError;
pub use session::*;
