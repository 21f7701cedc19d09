//! Tamarind CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! tamarind-cli migrate
//!
//! # Reset the database and load the sample admin user and catalog
//! tamarind-cli seed
//!
//! # Mint a bearer token for an existing user
//! tamarind-cli token --user-id 2f5a1b7e-9c44-4c1e-8d3a-64f0a1b2c3d4
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Reset and seed the database
//! - `token` - Mint a bearer token for local development

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tamarind-cli")]
#[command(author, version, about = "Tamarind CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Reset the database and load the sample admin user and catalog
    Seed,
    /// Mint a bearer token for an existing user
    Token {
        /// User id (UUID) to mint the token for
        #[arg(long)]
        user_id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Seed => commands::seed::run().await?,
        Commands::Token { user_id } => commands::token::mint(&user_id)?,
    }
    Ok(())
}
