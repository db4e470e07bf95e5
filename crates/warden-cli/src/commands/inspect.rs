//! inspect command - decode a session token

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use warden_auth::CookieSessionStore;
use warden_core::{Error, Identity};

use super::CommandContext;

#[derive(Serialize)]
struct InspectResult {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl InspectResult {
    fn from_outcome(outcome: &std::result::Result<Option<Identity>, Error>) -> Self {
        match outcome {
            Ok(Some(identity)) => Self {
                valid: true,
                user_id: Some(identity.user_id().to_string()),
                reason: None,
            },
            Ok(None) => Self {
                valid: true,
                user_id: None,
                reason: Some("session carries no user".to_string()),
            },
            Err(e) => Self {
                valid: false,
                user_id: None,
                reason: Some(e.to_string()),
            },
        }
    }
}

pub fn execute(ctx: &CommandContext, token: &str) -> Result<()> {
    let store = CookieSessionStore::from_config(&ctx.config.session)?;
    let outcome = store.open_token(token.trim());
    let result = InspectResult::from_outcome(&outcome);

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match (&result.user_id, &result.reason) {
            (Some(user_id), _) => println!("{} {}", "User:".green().bold(), user_id),
            (None, Some(reason)) if result.valid => println!("{} {}", "Empty:".yellow(), reason),
            (None, Some(reason)) => println!("{} {}", "Rejected:".red().bold(), reason),
            (None, None) => {}
        }
    }

    outcome?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_result() {
        let ok = InspectResult::from_outcome(&Ok(Some(Identity::new("alice"))));
        assert!(ok.valid);
        assert_eq!(ok.user_id.as_deref(), Some("alice"));

        let expired = InspectResult::from_outcome(&Err(Error::SessionExpired));
        assert!(!expired.valid);
        assert_eq!(expired.reason.as_deref(), Some("Session token has expired"));
    }
}
