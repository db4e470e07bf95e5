//! Request middleware

pub mod auth;

pub use auth::{require_identity, resolve_identity};
