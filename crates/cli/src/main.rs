//! Folio CLI - Database migrations and admin management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! folio-cli migrate
//!
//! # Grant or revoke admin access
//! folio-cli admin grant -e admin@example.com
//! folio-cli admin revoke -e admin@example.com
//!
//! # List admins
//! folio-cli admin list
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "folio-cli")]
#[command(author, version, about = "Folio CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage administrators
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Give an existing profile admin access
    Grant {
        /// Profile email address
        #[arg(short, long)]
        email: String,
    },
    /// Remove admin access from a profile
    Revoke {
        /// Profile email address
        #[arg(short, long)]
        email: String,
    },
    /// List profiles with admin access
    List,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Grant { email } => commands::admin::set_admin(&email, true).await?,
            AdminAction::Revoke { email } => commands::admin::set_admin(&email, false).await?,
            AdminAction::List => commands::admin::list().await?,
        },
    }
    Ok(())
}
