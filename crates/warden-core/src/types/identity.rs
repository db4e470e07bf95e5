//! Authenticated principal

use serde::{Deserialize, Serialize};
use std::fmt;

/// An authenticated principal.
///
/// Created by an authenticator on a successful login and compared by its
/// user id only. The id is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity {
    user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// Stable identifier of the principal
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn into_user_id(self) -> String {
        self.user_id
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_id)
    }
}
