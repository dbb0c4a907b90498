//! fragctl - command-line client for the fragments store
//!
//! Subcommands:
//! - `fragctl create --type <mime>` - Store stdin (or `--file`) as a new fragment
//! - `fragctl get <id>[.ext]` - Read a fragment, converted when an extension is given
//! - `fragctl info <id>` - Show metadata and the formats a fragment can be read as
//! - `fragctl list [--expand]` - List the owner's fragments
//! - `fragctl update <id> --type <mime>` - Replace a fragment's data
//! - `fragctl delete <id>` - Delete a fragment

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fragments::{FragmentError, FragmentsConfig};

mod commands;

#[derive(Parser)]
#[command(name = "fragctl")]
#[command(about = "Store and convert fragments")]
#[command(version)]
struct Cli {
    /// Owner the request acts for
    #[arg(short, long, env = "FRAGMENTS_OWNER", global = true)]
    owner: Option<String>,

    /// TOML config file with a [fragments] section
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a fragment
    Create {
        /// Content-Type of the payload (e.g., text/markdown)
        #[arg(short = 't', long = "type")]
        content_type: String,

        /// Read the payload from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Read a fragment, optionally converted (e.g., abc123.html)
    Get {
        /// Fragment id, optionally with an extension
        resource: String,

        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show a fragment's metadata
    Info {
        /// Fragment id
        id: String,
    },

    /// List fragments
    List {
        /// Return full metadata instead of ids
        #[arg(short, long)]
        expand: bool,
    },

    /// Replace a fragment's data
    Update {
        /// Fragment id
        id: String,

        /// Content-Type of the payload; must match the fragment's type
        #[arg(short = 't', long = "type")]
        content_type: String,

        /// Read the payload from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Delete a fragment
    Delete {
        /// Fragment id
        id: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<FragmentsConfig> {
    match path {
        Some(path) => FragmentsConfig::from_file(path),
        None => FragmentsConfig::from_env(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    fragments::telemetry::init(&config.log_level)?;

    // Every request acts for an owner; without one there is nobody to scope to.
    let owner = match cli.owner {
        Some(owner) if !owner.trim().is_empty() => owner,
        _ => return Err(FragmentError::InvalidOwner.into()),
    };
    let gateway = config.open_gateway();
    let ctx = commands::Context {
        gateway: gateway.as_ref(),
        owner: &owner,
        api_url: &config.api_url,
    };

    match cli.command {
        Commands::Create { content_type, file } => {
            commands::create(&ctx, &content_type, file.as_deref()).await
        }
        Commands::Get { resource, out } => commands::get(&ctx, &resource, out.as_deref()).await,
        Commands::Info { id } => commands::info(&ctx, &id).await,
        Commands::List { expand } => commands::list(&ctx, expand).await,
        Commands::Update {
            id,
            content_type,
            file,
        } => commands::update(&ctx, &id, &content_type, file.as_deref()).await,
        Commands::Delete { id } => commands::delete(&ctx, &id).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        match err.downcast_ref::<FragmentError>() {
            Some(fragment_err) if fragment_err.is_retryable() => eprintln!(
                "error {}: {} (storage failure, may be retried)",
                fragment_err.status_code(),
                fragment_err
            ),
            Some(fragment_err) => {
                eprintln!("error {}: {}", fragment_err.status_code(), fragment_err)
            }
            None => eprintln!("error: {:#}", err),
        }
        std::process::exit(1);
    }
}
