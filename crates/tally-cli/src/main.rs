//! Tally CLI - deterministic Q&A over your transaction history
//!
//! Usage:
//!   tally init                    Initialize database
//!   tally ingest --file CSV       Replace the dataset from a CSV export
//!   tally ask "How much ...?"     Ask a question
//!   tally summary --month 2025-06 Monthly report
//!   tally serve --port 3000       Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (warn)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Ingest { file } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_ingest(&db, &file)
        }
        Commands::Ask {
            question,
            month,
            limit,
            trace,
        } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_ask(&db, &question, month.as_deref(), limit, trace)
        }
        Commands::Summary { month, top_k } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_summary(&db, &month, top_k)
        }
        Commands::Transactions { limit } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_transactions_list(&db, limit)
        }
        Commands::Ingests => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_ingests(&db)
        }
        Commands::Status => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_status(&db)
        }
        Commands::Serve { port, host } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_serve(db, &host, port).await
        }
    }
}
