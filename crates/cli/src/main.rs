//! ReportDesk - terminal client for the enterprise reporting server
//!
//! # Usage
//!
//! ```bash
//! # Sign in (credential is kept in the platform data directory)
//! reportdesk login --username alice
//!
//! # What would the router do?
//! reportdesk navigate /report/template
//!
//! # Raw API call through the request pipeline
//! reportdesk call GET /dashboard/stats
//! reportdesk call GET /report/generate/42/download --binary --output report.pdf
//! ```

mod cmd;
mod terminal;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reportdesk_client::{ClientConfig, ReportClient};
use reportdesk_observability::{LogConfig, LogFormat};

/// ReportDesk - terminal client for the enterprise reporting server
#[derive(Parser, Debug)]
#[command(name = "reportdesk")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON client configuration file (environment variables still apply)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session credential
    Login(cmd::auth::LoginArgs),

    /// Sign out and clear the stored credential
    Logout,

    /// Show the identity behind the stored credential
    Whoami,

    /// Print the navigation menu visible to the current roles
    Menu,

    /// Evaluate a navigation the way the router would
    Navigate(cmd::navigate::NavigateArgs),

    /// Send a request through the pipeline and print the result
    Call(cmd::call::CallArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = ClientConfig::load(cli.config.as_deref())
        .context("failed to load client configuration")?;
    let client = ReportClient::builder(config)
        .interaction(Arc::new(terminal::TerminalInteraction))
        .build()
        .context("failed to set up the report client")?;

    match cli.command {
        Command::Login(args) => cmd::auth::run_login(&client, args).await,
        Command::Logout => cmd::auth::run_logout(&client).await,
        Command::Whoami => cmd::auth::run_whoami(&client).await,
        Command::Menu => cmd::navigate::run_menu(&client).await,
        Command::Navigate(args) => cmd::navigate::run(&client, args).await,
        Command::Call(args) => cmd::call::run(&client, args).await,
    }
}

/// Human-readable logs on stderr unless REPORTDESK_LOG_FORMAT says otherwise.
fn init_logging(level: &str) -> Result<()> {
    let config = LogConfig::default()
        .format(LogFormat::Pretty)
        .default_filter(level)
        .to_stderr()
        .with_format_var(std::env::var(reportdesk_observability::ENV_LOG_FORMAT).ok())?;
    reportdesk_observability::init(&config);
    Ok(())
}
