// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vidsift migrate` command implementation.
//!
//! Opens the store, which runs any pending schema migrations, then folds
//! in legacy plaintext state files if they are still present.

use vidsift_config::VidsiftConfig;
use vidsift_core::VidsiftError;
use vidsift_ingest::normalized_name;
use vidsift_storage::Store;

/// Run the `vidsift migrate` command.
pub async fn migrate_command(config: &VidsiftConfig) -> Result<(), VidsiftError> {
    let store = Store::open(&config.storage).await?;
    let normalize_flag = config.dedup.normalize_filenames;
    let imported = store
        .import_legacy(&config.storage, &move |name| {
            normalized_name(name, normalize_flag)
        })
        .await?;

    if imported.messages == 0 && imported.videos == 0 {
        println!("nothing to migrate");
    } else {
        println!(
            "imported {} message keys and {} video names from legacy files",
            imported.messages, imported.videos
        );
    }

    store.close().await?;
    Ok(())
}
