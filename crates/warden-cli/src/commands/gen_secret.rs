//! gen-secret command - print a random cookie secret

use anyhow::Result;
use warden_crypto::SessionKey;

use crate::OutputFormat;

pub fn execute(output: OutputFormat) -> Result<()> {
    let secret = SessionKey::generate().to_hex();

    match output {
        OutputFormat::Json => println!("{}", serde_json::json!({ "cookie_secret": secret })),
        OutputFormat::Text => println!("{}", secret),
    }

    Ok(())
}
