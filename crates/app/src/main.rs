//! `ledgerbridge` command line entry point.

// User-facing output goes to stdout; diagnostics go through tracing.
#![allow(clippy::print_stdout)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ledgerbridge_app::{commands, logging, AppContext};
use ledgerbridge_common::auth::TokenState;
use ledgerbridge_domain::AppConfig;
use ledgerbridge_infra::config;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "ledgerbridge", version, about = "Xero connection and bill sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (JSON or TOML). Environment variables still override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Xero: open the printed URL and approve access.
    Authorize {
        /// Seconds to wait for the browser redirect.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Show token and tenant status without refreshing.
    Status,
    /// Push a demo supplier bill, attaching files from the attachments dir.
    PushDemo {
        /// Bill id; files are read from `{attachments_dir}/{bill_id}/`.
        #[arg(long, default_value = "demo")]
        bill_id: String,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => {
            let from_file = config::load_from_file(Some(path.clone()))?;
            config::apply_overrides(from_file, |key| std::env::var(key).ok())?
        }
        None => config::load()?,
    };
    Ok(config)
}

async fn run(cli: Cli, ctx: AppContext) -> anyhow::Result<bool> {
    match cli.command {
        Commands::Authorize { timeout_secs } => {
            let outcome = commands::authorize(&ctx, timeout_secs.map(Duration::from_secs), |url| {
                println!("Open this URL in your browser to connect LedgerBridge to Xero:\n\n  {url}\n");
            })
            .await
            .context("authorization did not complete")?;

            println!("{}", outcome.user_message());
            Ok(outcome.is_success())
        }
        Commands::Status => {
            let status = commands::status(&ctx).await?;
            match status.token {
                TokenState::Unauthenticated => println!("token:  not connected"),
                TokenState::Valid { expires_at } => println!("token:  valid until {expires_at}"),
                TokenState::Expiring { expires_at } => {
                    println!("token:  expiring ({expires_at}), refreshed on next use");
                }
            }
            println!("tenant: {}", status.tenant_id.as_deref().unwrap_or("(none)"));
            Ok(status.token.is_authenticated())
        }
        Commands::PushDemo { bill_id } => {
            let (contact, bill, report) = commands::push_demo(&ctx, &bill_id).await?;

            println!("contact {} -> {}", contact.name, contact.remote_contact_id.unwrap_or_default());
            println!("bill {} -> invoice {}", bill.id, report.remote_invoice_id);
            for name in &report.attachments.uploaded {
                println!("  attached {name}");
            }
            for failure in &report.attachments.failed {
                println!("  failed   {}: {}", failure.filename, failure.error);
            }
            if let Some(reason) = &report.attachments.skipped {
                println!("  attachments skipped: {reason}");
            }
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(mut config) => {
            config.logging.json |= cli.json_logs;
            config
        }
        Err(err) => {
            logging::init(&AppConfig::default().logging);
            error!("failed to load configuration: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.logging);
    info!(version = env!("CARGO_PKG_VERSION"), "ledgerbridge starting");

    let ctx = match AppContext::new(config) {
        Ok(ctx) => ctx,
        Err(err) => {
            error!("failed to initialize: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli, ctx).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
