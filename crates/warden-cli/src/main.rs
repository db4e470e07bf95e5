//! Warden - pluggable username/password authentication
//!
//! Runs the HTTP login service and offers a few operator tools for checking
//! credentials and session tokens.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use commands::CommandContext;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use warden_core::config::WardenConfig;

#[derive(Parser)]
#[command(name = "warden")]
#[command(author = "Warden Team")]
#[command(version = warden_core::VERSION)]
#[command(about = "Pluggable username/password authentication", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "WARDEN_CONFIG")]
    config: Option<PathBuf>,

    /// Prefix for environment overrides (MYAPP -> MYAPP_LDAP_HOST)
    #[arg(long, global = true, env = "WARDEN_ENV_PREFIX", default_value = "")]
    env_prefix: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true, env = "WARDEN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Output format for command results
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind address
        #[arg(long, env = "WARDEN_BIND_ADDRESS")]
        bind: Option<String>,

        /// Port number
        #[arg(short, long, env = "WARDEN_PORT")]
        port: Option<u16>,
    },

    /// Authenticate once and print a session token
    Check {
        username: String,

        #[arg(long, env = "WARDEN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Decode a session token
    Inspect { token: String },

    /// Print a fresh random cookie secret
    GenSecret,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("warden {}", warden_core::VERSION);
            return Ok(());
        }
        Commands::GenSecret => return commands::gen_secret::execute(cli.output),
        _ => {}
    }

    let config = WardenConfig::load(cli.config.as_deref(), &cli.env_prefix)?;

    init_logging(
        cli.log_level.as_deref().unwrap_or(&config.logging.level),
        &config.logging.format,
    );

    let mut ctx = CommandContext {
        config,
        output_format: cli.output,
    };

    match cli.command {
        Commands::Serve { bind, port } => {
            if let Some(bind) = bind {
                ctx.config.server.bind_address = bind;
            }
            if let Some(port) = port {
                ctx.config.server.port = port;
            }
            commands::serve::execute(ctx).await
        }
        Commands::Check { username, password } => {
            commands::check::execute(&ctx, &username, &password).await
        }
        Commands::Inspect { token } => commands::inspect::execute(&ctx, &token),
        Commands::GenSecret | Commands::Version => Ok(()),
    }
}

/// Logs go to stderr so command output on stdout stays machine-readable
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
