//! postbox: send transactional notifications from JSON payloads.
//!
//! Configuration comes from the environment (and `.env`), see
//! `postbox_core::config`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing::info;

use postbox_core::config::{load_dotenv, Config};
use postbox_core::{ContactInquiry, DocumentBundle, OrderConfirmation};
use postbox_notify::Mailer;

// ── CLI ─────────────────────────────────────────────────────────────

/// Dispatch contact, order and document notifications.
#[derive(Parser, Debug)]
#[command(name = "postbox", version, about)]
struct Cli {
    /// Log at debug level (RUST_LOG still wins when set).
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Config profile; keys are looked up as `{PROFILE}_{KEY}` first.
    #[arg(long, env = "POSTBOX_PROFILE", global = true, default_value = "")]
    profile: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Forward a contact-form submission to the support mailbox.
    Contact { file: PathBuf },
    /// Send an order confirmation. Delivery problems are logged, not fatal.
    Order {
        file: PathBuf,
        /// Recipient address.
        #[arg(long)]
        to: String,
    },
    /// Deliver a document bundle, escalating through every fallback.
    Documents { file: PathBuf },
    /// Print customer instructions for a document bundle.
    Instructions { file: PathBuf },
    /// Print the redacted configuration.
    Config,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Parse arguments after `.env` is loaded, so `POSTBOX_PROFILE` set there
/// reaches clap's `env` fallback.
fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    load_dotenv();
    Cli::try_parse_from(args)
}

fn connect(config: Config) -> anyhow::Result<Mailer> {
    config.log_summary();
    Ok(Mailer::from_config(config)?)
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit());

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let config = Config::for_profile(&cli.profile);

    match cli.command {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config.redacted_summary())?);
        }
        Command::Contact { file } => {
            let inquiry: ContactInquiry = read_json(&file)?;
            connect(config)?.submit_contact_inquiry(&inquiry).await?;
            info!(from = %inquiry.email, "contact inquiry forwarded");
        }
        Command::Order { file, to } => {
            let order: OrderConfirmation = read_json(&file)?;
            connect(config)?.submit_order_confirmation(&order, &to).await;
            info!(order_id = %order.order_id, "order confirmation processed");
        }
        Command::Documents { file } => {
            let bundle: DocumentBundle = read_json(&file)?;
            let mailer = connect(config)?;
            mailer.submit_document_bundle(&bundle).await?;
            info!(order_id = %bundle.order_id, documents = bundle.documents.len(), "document bundle delivered");
            println!("{}", mailer.delivery_instructions(&bundle));
        }
        Command::Instructions { file } => {
            let bundle: DocumentBundle = read_json(&file)?;
            println!("{}", connect(config)?.delivery_instructions(&bundle));
        }
    }

    Ok(())
}
