//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::auth;
use crate::config::Config;
use crate::error::Result;
use crate::models::TickOutcome;
use crate::server::{self, AppState};
use crate::service::{self, ServiceHandle};

#[derive(Parser, Debug)]
#[command(name = "gmail-autoreply")]
#[command(version = "0.1.0")]
#[command(about = "Automatic vacation replies for a Gmail inbox", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to OAuth2 credentials file (overrides auth.credentials_path)
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// Path to token cache file (overrides auth.token_cache_path)
    #[arg(long)]
    pub token_cache: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the reply loop and the HTTP status endpoint
    Serve {
        /// Port for the status endpoint (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Log the replies that would be sent without sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Authenticate with Gmail API
    Auth {
        /// Force re-authentication even if token exists
        #[arg(long)]
        force: bool,
    },

    /// Resolve the marker label and run a single tick
    Once {
        /// Log the replies that would be sent without sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate example configuration file
    InitConfig {
        /// Path to create config file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.credentials {
            config.auth.credentials_path = path.clone();
        }
        if let Some(path) = &self.token_cache {
            config.auth.token_cache_path = path.clone();
        }
        match &self.command {
            Commands::Serve { port, dry_run } => {
                if let Some(port) = port {
                    config.server.port = *port;
                }
                config.execution.dry_run |= *dry_run;
            }
            Commands::Once { dry_run } => {
                config.execution.dry_run |= *dry_run;
            }
            Commands::Auth { .. } | Commands::InitConfig { .. } => {}
        }
    }

    /// Load the configuration file and apply overrides
    pub async fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(&self.config).await?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }
}

/// Authenticate once, start the reply loop, and serve status until Ctrl-C
pub async fn run_serve(config: &Config) -> Result<()> {
    let client = service::connect(config).await?;
    let handle = ServiceHandle::start(config, client).await?;

    let state = AppState {
        responder: handle.responder(),
    };
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received shutdown signal");
    };

    let served = server::serve(&config.server, state, shutdown).await;
    handle.shutdown().await;
    served
}

/// Run the OAuth flow and report the connected account
pub async fn run_auth(config: &Config, force: bool) -> Result<String> {
    let token_cache = &config.auth.token_cache_path;
    if force && token_cache.exists() {
        tokio::fs::remove_file(token_cache).await?;
        info!("Removed existing token cache");
    }

    let hub = auth::initialize_gmail_hub(&config.auth.credentials_path, token_cache).await?;

    let (_, profile) = hub
        .users()
        .get_profile("me")
        .add_scope(auth::SCOPE_READONLY)
        .doit()
        .await?;

    Ok(profile.email_address.unwrap_or_default())
}

/// Resolve the marker label and process the inbox exactly once
pub async fn run_once(config: &Config) -> Result<TickOutcome> {
    let client = service::connect(config).await?;
    let responder = service::prepare_responder(config, client).await?;
    responder.run_tick().await
}
