//! serve command - run the HTTP server

use anyhow::Result;
use tracing::info;
use warden_server::AuthServer;

use super::CommandContext;

pub async fn execute(ctx: CommandContext) -> Result<()> {
    ctx.config.validate()?;

    info!("Starting Warden {}", warden_core::VERSION);
    info!("Authenticator: {}", ctx.config.auth.kind()?.as_str());

    AuthServer::new(ctx.config).run().await?;
    Ok(())
}
