// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vidsift status` command implementation.
//!
//! Prints processed-state counters, the cached destination group and
//! topic ids, and the audit log size. Read-only.

use colored::Colorize;

use vidsift_config::VidsiftConfig;
use vidsift_core::VidsiftError;
use vidsift_ingest::{AuditLog, ForumCache};
use vidsift_storage::Store;

/// Run the `vidsift status` command.
pub async fn status_command(config: &VidsiftConfig) -> Result<(), VidsiftError> {
    let store = Store::open(&config.storage).await?;

    println!("{}", "processed state".bold());
    println!("  messages: {}", store.message_count().await?);
    println!("  videos:   {}", store.video_count().await?);
    for (topic, count) in store.video_counts_by_topic().await? {
        println!("    {} {}", topic.cyan(), count);
    }

    let cache = ForumCache::load(&config.storage.forum_cache_path())?;
    println!("{}", "destination".bold());
    match cache.group_id {
        Some(id) => println!("  group: {id}"),
        None => println!("  group: {}", "not provisioned".dimmed()),
    }
    for (keyword, topic_id) in &cache.topics {
        println!("    {} -> topic {}", keyword.cyan(), topic_id);
    }

    let audit = AuditLog::new(config.storage.audit_log_path());
    let entries = audit.entries().await?;
    println!("{}", "forwarding log".bold());
    println!("  entries: {}", entries.len());
    if let Some(last) = entries.last() {
        println!(
            "  last: {} -> {} ({})",
            last.file_name, last.topic_name, last.timestamp
        );
    }

    store.close().await?;
    Ok(())
}
