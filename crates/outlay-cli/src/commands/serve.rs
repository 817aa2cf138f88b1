//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Outlay web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }

    let config = outlay_server::ServerConfig::from_env();

    if config.allowed_origins.is_empty() {
        println!("   🌐 CORS: same-origin only (set OUTLAY_ALLOWED_ORIGINS)");
    } else {
        println!("   🌐 CORS origins: {}", config.allowed_origins.join(", "));
    }
    if !config.trusted_proxies.is_empty() {
        println!(
            "   🔀 Trusted proxies: {} (OUTLAY_TRUSTED_PROXIES)",
            config
                .trusted_proxies
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    if config.rate_limit == 0 {
        println!("   ⚠️  Rate limiting: DISABLED");
    } else {
        println!("   🚦 Rate limit: {} requests/minute per IP", config.rate_limit);
    }
    println!("   🔑 Token lifetime: {}s", config.token_ttl.as_secs());
    println!();

    let db = open_db(db_path)?;
    let static_dir = static_dir
        .map(|d| d.to_str().context("Static dir path is not valid UTF-8"))
        .transpose()?;

    outlay_server::serve_with_config(db, host, port, static_dir, config).await
}
