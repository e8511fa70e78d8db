//! basecamp-cli - Basecamp OAuth login and API access from the terminal
//!
//! Signs in through Launchpad with a loopback redirect, caches the tokens
//! on disk and issues authenticated GETs against the Basecamp API.

mod api;
mod auth;
mod config;
mod models;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Overrides, Settings};

#[derive(Parser)]
#[command(name = "basecamp-cli")]
#[command(about = "Command-line OAuth2 login and API access for Basecamp", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to the platform config dir)
    #[arg(long, global = true, env = "BASECAMP_CONFIG")]
    config: Option<PathBuf>,

    /// Token store file
    #[arg(long, global = true, env = "BASECAMP_TOKEN_STORE")]
    store: Option<PathBuf>,

    /// Basecamp account id
    #[arg(long, global = true, env = "BASECAMP_ACCOUNT_ID")]
    account: Option<String>,

    /// Loopback port for the OAuth redirect
    #[arg(long, global = true, env = "BASECAMP_REDIRECT_PORT")]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate with Basecamp (refreshes if a token is cached)
    Login {
        /// Run the browser flow even if a cached token exists
        #[arg(short, long)]
        force: bool,

        /// Launchpad application client id, saved to the token store
        #[arg(long, env = "BASECAMP_CLIENT_ID")]
        client_id: Option<String>,

        /// Launchpad application client secret, saved to the token store
        #[arg(long, env = "BASECAMP_CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,
    },

    /// Clear cached tokens (client credentials are kept)
    Logout,

    /// Show current authentication status
    Status,

    /// Show the signed-in identity and its accounts
    Whoami,

    /// List projects in the account
    Projects,

    /// GET an API path (relative to the account) or a full URL
    Get {
        /// e.g. `projects.json` or `https://3.basecampapi.com/999/people.json`
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let settings = Settings::load(cli.config.as_deref())?.with_overrides(Overrides {
        account_id: cli.account,
        redirect_port: cli.port,
        token_store: cli.store,
    });

    match cli.command {
        Commands::Login {
            force,
            client_id,
            client_secret,
        } => {
            tracing::info!("Starting authentication flow...");
            auth::login(&settings, force, client_id, client_secret).await?;
        }
        Commands::Logout => {
            tracing::info!("Logging out...");
            auth::logout(&settings).await?;
        }
        Commands::Status => {
            auth::status(&settings).await?;
        }
        Commands::Whoami => {
            api::whoami(&settings).await?;
        }
        Commands::Projects => {
            tracing::info!("Fetching projects...");
            api::list_projects(&settings).await?;
        }
        Commands::Get { path } => {
            api::get(&settings, &path).await?;
        }
    }

    Ok(())
}
