//! HTTP front end for Warden
//!
//! Exposes an [`AuthenticationService`](warden_auth::AuthenticationService)
//! as login, logout and whoami endpoints.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{create_router, AppState, AuthServer};
