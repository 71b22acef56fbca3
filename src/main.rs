use anyhow::Result;
use clap::Parser;
use gmail_autoreply::cli::{self, Cli, Commands};
use gmail_autoreply::config::Config;
use gmail_autoreply::error::GmailError;
use gmail_autoreply::models::TickOutcome;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Exit with proper code on error
    if let Err(e) = run().await {
        display_error(&e);
        eprintln!("\nFor help, run: gmail-autoreply --help");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Install default crypto provider for rustls
    // On non-Windows platforms, use aws-lc-rs; on Windows, use ring
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_autoreply=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_autoreply=info,warn,error"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    match &cli.command {
        Commands::Serve { .. } => {
            let config = cli.load_config().await?;
            if config.execution.dry_run {
                println!("Running in DRY RUN mode - no replies will be sent");
            }
            tracing::info!("Gmail auto-reply service starting...");

            cli::run_serve(&config).await?;
            Ok(())
        }

        Commands::Auth { force } => {
            tracing::info!("Authenticating with Gmail API...");
            let config = cli.load_config().await?;

            let account = cli::run_auth(&config, *force).await?;

            println!("Successfully authenticated with Gmail API");
            println!("Token cached at: {:?}", config.auth.token_cache_path);
            println!("Connected to account: {}", account);
            Ok(())
        }

        Commands::Once { .. } => {
            let config = cli.load_config().await?;
            if config.execution.dry_run {
                println!("Running in DRY RUN mode - no replies will be sent");
            }

            match cli::run_once(&config).await? {
                TickOutcome::Completed(report) => {
                    println!("Fetched:         {}", report.fetched);
                    println!("Replied:         {}", report.replied);
                    if config.execution.dry_run {
                        println!("Would reply:     {}", report.would_reply);
                    }
                    println!("Already replied: {}", report.already_replied);
                }
                TickOutcome::Skipped => println!("Tick skipped: another tick is in flight"),
            }
            Ok(())
        }

        Commands::InitConfig { output, force } => {
            tracing::info!("Generating example configuration file");

            if output.exists() && !force {
                return Err(GmailError::ConfigError(format!(
                    "Configuration file already exists at {:?}. Use --force to overwrite.",
                    output
                ))
                .into());
            }

            Config::create_example(output).await?;

            println!("Created example configuration file at: {:?}", output);
            println!("\nPlease edit this file to customize your settings.");
            println!("Key settings to review:");
            println!("  - poll.min_delay_secs / poll.max_delay_secs: Interval between inbox checks");
            println!("  - reply.label_name: Label applied to answered messages");
            println!("  - reply.body: Text of the automatic reply");
            println!("  - server.port: Port of the status endpoint");

            Ok(())
        }
    }
}

fn display_error(error: &anyhow::Error) {
    eprintln!("Error: {}", error);

    let mut cause = error.source();
    while let Some(e) = cause {
        eprintln!("  Caused by: {}", e);
        cause = e.source();
    }

    if let Some(gmail_err) = error.downcast_ref::<GmailError>() {
        match gmail_err {
            GmailError::AuthError(_) => {
                eprintln!("\nHint: Make sure your credentials.json file is valid.");
                eprintln!("      You can download it from Google Cloud Console.");
                eprintln!("      Try running: gmail-autoreply auth --force");
            }
            GmailError::Forbidden(_) => {
                eprintln!("\nHint: The cached token may lack a required scope.");
                eprintln!("      Try running: gmail-autoreply auth --force");
            }
            GmailError::RateLimitExceeded(_) | GmailError::ServerError { .. } => {
                eprintln!("\nHint: This may be a temporary API error.");
                eprintln!("      Try running the command again.");
            }
            GmailError::ConfigError(_) => {
                eprintln!("\nHint: Check your configuration file for errors.");
                eprintln!("      Run: gmail-autoreply init-config --force");
            }
            _ => {}
        }
    }
}
