//! check command - authenticate once against the configured backend

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use warden_auth::{AuthenticationService, Authenticator, SessionStore};

use super::CommandContext;

#[derive(Serialize)]
struct CheckResult {
    user_id: String,
    authenticator: &'static str,
    token: String,
}

pub async fn execute(ctx: &CommandContext, username: &str, password: &str) -> Result<()> {
    let service = AuthenticationService::from_config(&ctx.config)?;

    let identity = service
        .authenticate(username, password)
        .await
        .with_context(|| format!("{} rejected {}", service.kind(), username))?;

    let result = CheckResult {
        user_id: identity.user_id().to_string(),
        authenticator: service.kind(),
        token: service.issue_token(&identity)?,
    };

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "{} {} via {}",
            "Authenticated".green().bold(),
            result.user_id.bold(),
            result.authenticator
        );
        println!("{}", result.token);
    }

    Ok(())
}
