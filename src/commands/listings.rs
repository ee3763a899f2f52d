//! Listings command - Show recorded listing outcomes

use anyhow::Result;
use colored::*;
use verdigris::config::Config;
use verdigris::storage::{ListingStatus, SqliteStorage, Storage};

pub fn execute(failed: bool, retryable: bool) -> Result<()> {
    let config = Config::load()?;
    let storage = SqliteStorage::open(&config.data_dir())?;
    let mut records = storage.all_listing_statuses()?;

    if failed {
        records.retain(|record| record.status == ListingStatus::Failed);
    }
    if retryable {
        records.retain(|record| record.retryable);
    }

    if records.is_empty() {
        println!("No recorded listings match.");
        return Ok(());
    }

    println!("📦 {} listings", records.len());
    println!();
    for record in &records {
        let status = match record.status {
            ListingStatus::Submitted => record.status.as_str().green(),
            ListingStatus::ReadyForSubmit => record.status.as_str().bright_cyan(),
            ListingStatus::Failed => record.status.as_str().red(),
        };
        print!(
            "  {}  {:<16} {}",
            record.updated_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            status,
            record.listing_id
        );
        if let Some(reason) = &record.reason {
            print!("  ({reason})");
        }
        if record.retryable {
            print!("  {}", "[retryable]".yellow());
        }
        println!();
    }

    Ok(())
}
