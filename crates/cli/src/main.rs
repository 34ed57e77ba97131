//! Chalkboard CLI - seeding and account management tools.
//!
//! # Usage
//!
//! ```bash
//! # Seed a demo educator and a small demo catalog
//! cb-cli seed
//!
//! # Grant the educator role to an existing account
//! cb-cli grant-educator -e asha@example.com -s "Design"
//! ```
//!
//! # Commands
//!
//! - `seed` - Create demo data through the same services the server uses
//! - `grant-educator` - Operator override that rewrites a profile's role
//!   (the application itself never changes roles after signup)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cb-cli")]
#[command(author, version, about = "Chalkboard CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed a demo educator account and catalog
    Seed {
        /// Password for the demo educator account
        #[arg(short, long, default_value = "demo-pass-123")]
        password: String,
    },
    /// Grant the educator role to an existing account
    GrantEducator {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Teaching subject to record on the profile
        #[arg(short, long, default_value = "")]
        subject: String,
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
        Commands::Seed { password } => commands::seed::demo_catalog(&password).await?,
        Commands::GrantEducator { email, subject } => {
            commands::grant::educator_role(&email, &subject).await?;
        }
    }
    Ok(())
}
