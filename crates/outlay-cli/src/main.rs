//! Outlay CLI - Personal expense tracker
//!
//! Usage:
//!   outlay init                               Initialize database
//!   outlay serve --port 8080                  Start web server
//!   outlay expenses --user EMAIL list         Show recent expenses
//!   outlay report --user EMAIL analytics      Budget recommendations

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Serve {
            port,
            host,
            static_dir,
        } => commands::cmd_serve(&cli.db, &host, port, static_dir.as_deref()).await,
        Commands::Status => commands::cmd_status(&cli.db),
        Commands::Users => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_users(&db)
        }
        Commands::Categories { user, action } => {
            let db = commands::open_db(&cli.db)?;
            let user = commands::resolve_user(&db, &user)?;
            match action {
                None | Some(CategoriesAction::List) => commands::cmd_categories_list(&db, &user),
                Some(CategoriesAction::Add { name, description }) => {
                    commands::cmd_categories_add(&db, &user, &name, &description)
                }
                Some(CategoriesAction::Seed) => commands::cmd_categories_seed(&db, &user),
            }
        }
        Commands::Expenses { user, action } => {
            let db = commands::open_db(&cli.db)?;
            let user = commands::resolve_user(&db, &user)?;
            match action {
                None => commands::cmd_expenses_list(&db, &user, 20),
                Some(ExpensesAction::List { limit }) => {
                    commands::cmd_expenses_list(&db, &user, limit)
                }
                Some(ExpensesAction::Add {
                    amount,
                    description,
                    date,
                    category,
                }) => commands::cmd_expenses_add(&db, &user, amount, &description, &date, &category),
            }
        }
        Commands::Report { user, report } => {
            let db = commands::open_db(&cli.db)?;
            let user = commands::resolve_user(&db, &user)?;
            match report {
                ReportType::Summary { from, to } => {
                    commands::cmd_report_summary(&db, &user, from.as_deref(), to.as_deref())
                }
                ReportType::Monthly { year } => commands::cmd_report_monthly(&db, &user, year),
                ReportType::Analytics { from, to, month } => commands::cmd_report_analytics(
                    &db,
                    &user,
                    from.as_deref(),
                    to.as_deref(),
                    month.as_deref(),
                ),
            }
        }
    }
}
