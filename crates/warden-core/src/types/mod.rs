//! Warden domain types

mod identity;

pub use identity::*;
