//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init) and shared utilities (open_db, resolve_user)
//! - `categories` - Category commands (list, add, seed)
//! - `expenses` - Expense commands (list, add)
//! - `reports` - Report generation commands
//! - `serve` - Web server command
//! - `status` - Status and user listing

pub mod categories;
pub mod core;
pub mod expenses;
pub mod reports;
pub mod serve;
pub mod status;

// Re-export command functions for main.rs
pub use categories::*;
pub use core::*;
pub use expenses::*;
pub use reports::*;
pub use serve::*;
pub use status::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
