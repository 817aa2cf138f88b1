//! Status and user listing commands

use std::path::Path;

use anyhow::Result;
use outlay_core::db::Database;

use super::{open_db, truncate};

pub fn cmd_status(db_path: &Path) -> Result<()> {
    println!();
    println!("📊 Outlay Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Database: {}", db_path.display());

    if !db_path.exists() {
        println!("   Size: (database not initialized)");
        println!();
        println!("   Run 'outlay init' to create it.");
        return Ok(());
    }

    if let Ok(metadata) = std::fs::metadata(db_path) {
        let size_kb = metadata.len() as f64 / 1024.0;
        if size_kb < 1024.0 {
            println!("   Size: {:.1} KB", size_kb);
        } else {
            println!("   Size: {:.1} MB", size_kb / 1024.0);
        }
    }

    match open_db(db_path).and_then(|db| Ok(db.stats()?)) {
        Ok(stats) => {
            println!();
            println!("   Users: {}", stats.users);
            println!("   Categories: {}", stats.categories);
            println!("   Expenses: {}", stats.expenses);
        }
        Err(e) => {
            println!();
            println!("   ❌ Error opening database: {}", e);
        }
    }

    Ok(())
}

pub fn cmd_users(db: &Database) -> Result<()> {
    let users = db.list_users()?;

    if users.is_empty() {
        println!("No users registered yet.");
        return Ok(());
    }

    println!();
    println!("👤 Users");
    println!("   ─────────────────────────────────────────────────────────────");
    for user in &users {
        println!(
            "   {:>4}  {:<24} {:<32} {}",
            user.id,
            truncate(&user.name, 24),
            truncate(&user.email, 32),
            user.created_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}
