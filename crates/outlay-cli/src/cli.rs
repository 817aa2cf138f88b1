//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Outlay - Track expenses and see where the money goes
#[derive(Parser)]
#[command(name = "outlay")]
#[command(about = "Self-hosted personal expense tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "outlay.db", global = true)]
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

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory of a built frontend to serve
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Show database status
    Status,

    /// List registered users
    Users,

    /// Manage a user's categories
    Categories {
        /// User email
        #[arg(short, long)]
        user: String,

        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Manage a user's expenses
    Expenses {
        /// User email
        #[arg(short, long)]
        user: String,

        #[command(subcommand)]
        action: Option<ExpensesAction>,
    },

    /// Spending reports
    Report {
        /// User email
        #[arg(short, long)]
        user: String,

        #[command(subcommand)]
        report: ReportType,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories
    List,

    /// Add a category
    Add {
        /// Category name
        name: String,

        /// Short description
        #[arg(default_value = "")]
        description: String,
    },

    /// Create the template categories
    Seed,
}

#[derive(Subcommand)]
pub enum ExpensesAction {
    /// List recent expenses
    List {
        /// Number of expenses to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Record an expense
    Add {
        /// Amount (positive)
        amount: f64,

        /// What it was for
        description: String,

        /// Date (YYYY-MM-DD)
        date: String,

        /// Category name or ID
        category: String,
    },
}

#[derive(Subcommand)]
pub enum ReportType {
    /// Totals per category
    Summary {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Monthly totals for a year
    Monthly {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
    },

    /// Trends, budget recommendations and forecast
    Analytics {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Limit the window to one calendar month (YYYY-M)
        #[arg(long, conflicts_with_all = ["from", "to"])]
        month: Option<String>,
    },
}
