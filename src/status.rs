// System status display — store location, size, counts and latest action.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::db::Database;

/// Display system status to the terminal.
pub async fn show(db: &Arc<dyn Database>, db_path: &str, backend: &str) -> Result<()> {
    if !Path::new(db_path).exists() {
        println!("Store: not initialized");
        println!("\nRun `groupguard init` to create it.");
        return Ok(());
    }

    let file_size = std::fs::metadata(db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Store: {} ({}, {})", db_path, backend, file_size);

    let stats = db.stats().await?;
    println!(
        "Actions: {} total ({} violations, {} sticker violations, {} blocks)",
        stats.actions, stats.violations, stats.sticker_violations, stats.blocks
    );
    println!(
        "Groups tracked: {} ({} users with strikes)",
        stats.groups, stats.users_with_strikes
    );

    match db.recent_actions(1).await?.first() {
        Some(last) => println!(
            "Last action: {} on {} ({})",
            last.kind,
            last.user,
            last.time.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => println!("Last action: none yet"),
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
