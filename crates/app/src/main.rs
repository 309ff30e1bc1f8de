//! `assess`: take grammar assessments from the terminal.

use std::io;
use std::process;

use anyhow::{Context, Result};
use assess_core::model::{TestCategory, UserId};
use clap::{Parser, Subcommand};
use services::AppServices;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::{AppConfig, DEFAULT_DB_URL};

#[derive(Parser)]
#[command(name = "assess", version, about = "Grammar assessment sessions")]
struct Cli {
    /// `SQLite` database holding accounts and results
    #[arg(long, global = true, env = "ASSESS_DB_URL", default_value = DEFAULT_DB_URL)]
    db_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available tests
    Catalog {
        /// Only show this category (kids, adults)
        #[arg(long)]
        category: Option<TestCategory>,
    },

    /// Sign in and take a test
    Take {
        #[arg(long)]
        email: String,

        /// Create the account instead of signing in
        #[arg(long)]
        register: bool,

        /// Test to take (kids, adults)
        #[arg(long)]
        category: TestCategory,

        /// Read the password from the environment instead of prompting
        #[arg(long, env = "ASSESS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Show saved results for a user, newest first
    Results {
        #[arg(long)]
        user_id: UserId,

        #[arg(long, default_value = "10")]
        limit: u32,
    },
}

async fn run(cli: Cli) -> Result<()> {
    let mut stdout = io::stdout().lock();

    if let Commands::Catalog { category } = &cli.command {
        let bank = assess_core::QuestionBank::builtin()?;
        return commands::catalog(&bank, *category, &mut stdout);
    }

    let config = AppConfig::resolve(cli.db_url)?;
    tracing::info!(db_url = %config.db_url, "opening database");
    let services = AppServices::new_sqlite(&config.db_url, config.identity)
        .await
        .context("starting services")?;

    match cli.command {
        Commands::Catalog { .. } => Ok(()),
        Commands::Take {
            email,
            register,
            category,
            password,
        } => {
            let args = commands::TakeArgs {
                email,
                password,
                register,
                category,
            };
            commands::take(&services, args, &mut io::stdin().lock(), &mut stdout).await
        }
        Commands::Results { user_id, limit } => {
            commands::results(&services, user_id, limit, &mut stdout).await
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        process::exit(2);
    }
}
