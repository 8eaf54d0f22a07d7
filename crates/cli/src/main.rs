//! Shopfront CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply the schema and the session table
//! shop-cli migrate
//!
//! # Create the first admin (the web form requires a logged-in admin)
//! shop-cli admin create -u root -p 'correct horse battery'
//!
//! # Insert a handful of demo items
//! shop-cli seed items
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create admin accounts
//! - `seed items` - Seed the catalog with demo items
//!
//! All commands read the database location from `SHOP_DATABASE_URL`
//! (or `DATABASE_URL`), like the server does.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "shop-cli")]
#[command(author, version, about = "Shopfront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database with demo data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert demo catalog items (without image files)
    Items,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { username, password } => {
                commands::admin::create(&username, &password).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Items => {
                commands::seed::items().await?;
            }
        },
    }
    Ok(())
}
