//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - ask questions about your spending, get provable answers
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Deterministic Q&A over your transaction history", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Replace the dataset from a CSV export
    Ingest {
        /// CSV file to ingest (columns: Date, Amount, Where?, What?, Category, Source)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Ask a question about your transactions
    Ask {
        /// The question, e.g. "How much did I spend on Food in 2025-06?"
        question: String,

        /// Explicit month (YYYY-MM); overrides any month in the question
        #[arg(short, long)]
        month: Option<String>,

        /// Maximum evidence rows to show
        #[arg(short, long, default_value = "20")]
        limit: i64,

        /// Print the full trace as JSON
        #[arg(long)]
        trace: bool,
    },

    /// Show the monthly summary report
    Summary {
        /// Month in YYYY-MM format
        #[arg(short, long)]
        month: String,

        /// Number of top merchants to show
        #[arg(long, default_value = "5")]
        top_k: i64,
    },

    /// List recent transactions
    Transactions {
        /// Maximum rows to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Show ingestion history
    Ingests,

    /// Show database status
    Status,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}
