//! Warden HTTP server

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::info;
use warden_auth::{AuthenticationService, Authenticator};
use warden_core::{config::WardenConfig, Result};

use crate::middleware::require_identity;
use crate::routes;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: AuthenticationService,
}

impl AppState {
    pub fn new(service: AuthenticationService) -> Self {
        Self { service }
    }
}

/// Warden HTTP server
pub struct AuthServer {
    config: Arc<WardenConfig>,
}

impl AuthServer {
    pub fn new(config: WardenConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub async fn run(self) -> Result<()> {
        let service = AuthenticationService::from_config(&self.config)?;
        let kind = service.kind();
        let app = create_router(AppState::new(service));

        let addr = format!(
            "{}:{}",
            self.config.server.bind_address, self.config.server.port
        );
        let listener = TcpListener::bind(&addr).await?;

        info!("Warden listening on http://{}", addr);
        info!("Authenticator: {}", kind);

        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Build the router for `state`
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/whoami", get(routes::whoami))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_identity,
        ));

    Router::new()
        .route("/health", get(routes::health))
        .route("/login", post(routes::login))
        .route("/logout", post(routes::logout))
        .merge(protected)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .with_state(state)
}
