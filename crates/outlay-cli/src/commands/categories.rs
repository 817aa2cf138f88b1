//! Category command implementations

use anyhow::{Context, Result};
use outlay_core::db::Database;
use outlay_core::models::User;

use super::truncate;

pub fn cmd_categories_list(db: &Database, user: &User) -> Result<()> {
    let categories = db.list_categories(user.id)?;

    if categories.is_empty() {
        println!(
            "No categories found. Run 'outlay categories --user {} seed' to add the defaults.",
            user.email
        );
        return Ok(());
    }

    println!();
    println!("🏷️  Categories for {}", user.email);
    println!("   ─────────────────────────────────────────────────────────────");
    for category in &categories {
        println!(
            "   {:>4}  {:<20} {}",
            category.id,
            truncate(&category.name, 20),
            truncate(&category.description, 50)
        );
    }

    Ok(())
}

pub fn cmd_categories_add(db: &Database, user: &User, name: &str, description: &str) -> Result<()> {
    let id = db
        .create_category(user.id, name, description)
        .with_context(|| format!("Failed to create category '{}'", name))?;
    println!("✅ Created category '{}' (ID: {})", name.trim(), id);
    Ok(())
}

pub fn cmd_categories_seed(db: &Database, user: &User) -> Result<()> {
    let created = db.seed_categories(user.id)?;
    if created == 0 {
        println!("All template categories already exist.");
    } else {
        println!("✅ Created {} template categories", created);
    }
    Ok(())
}
