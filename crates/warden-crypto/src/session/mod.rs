//! Session token sealing
//!
//! Token layout (URL-safe base64, no padding):
//!
//! ```text
//! version (1) || nonce (12) || AES-256-GCM ciphertext + tag (16)
//! ```
//!
//! The token name (the cookie name) is bound as associated data.

mod codec;
mod key;

pub use codec::*;
pub use key::*;
