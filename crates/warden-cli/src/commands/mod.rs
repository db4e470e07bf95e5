//! CLI command implementations

pub mod check;
pub mod gen_secret;
pub mod inspect;
pub mod serve;

use warden_core::config::WardenConfig;

use crate::OutputFormat;

/// Context passed to all commands
pub struct CommandContext {
    pub config: WardenConfig,
    pub output_format: OutputFormat,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }
}
