// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Destination forum group and topic provisioning cache.
//!
//! Provisioning itself is the upstream collaborator's job; this module
//! consumes its contract: a persistent `{group_id, topics}` mapping cached
//! in `forum-group-cache.json` so repeated runs reuse the same group and
//! topic ids instead of re-provisioning.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use vidsift_config::VidsiftConfig;
use vidsift_core::{ChatClient, ChatId, TopicId, VidsiftError};

use crate::driver::RateLimitDriver;

/// Cached destination ids, one file per data directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForumCache {
    /// Destination group id, once provisioned.
    #[serde(default)]
    pub group_id: Option<i64>,
    /// Topic ids by match keyword.
    #[serde(default)]
    pub topics: BTreeMap<String, i64>,
}

impl ForumCache {
    /// Load the cache file, or an empty cache when absent.
    pub fn load(path: &Path) -> Result<Self, VidsiftError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| VidsiftError::Io {
            message: format!("failed to read forum cache {}", path.display()),
            source: e,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| VidsiftError::Internal(format!("forum cache is corrupt: {e}")))
    }

    /// Persist the cache file.
    pub fn save(&self, path: &Path) -> Result<(), VidsiftError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| VidsiftError::Io {
                message: format!("failed to create {}", parent.display()),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| VidsiftError::Internal(format!("forum cache serialization: {e}")))?;
        std::fs::write(path, json).map_err(|e| VidsiftError::Io {
            message: format!("failed to write forum cache {}", path.display()),
            source: e,
        })
    }
}

/// Ensure the destination group and one topic per match keyword exist,
/// provisioning whatever the cache is missing, and persist the cache.
///
/// Returns the destination chat id and the keyword → topic mapping for
/// this run's match list.
pub async fn ensure_destination(
    client: &dyn ChatClient,
    driver: &RateLimitDriver,
    config: &VidsiftConfig,
) -> Result<(ChatId, BTreeMap<String, TopicId>), VidsiftError> {
    let cache_path = config.storage.forum_cache_path();
    let mut cache = ForumCache::load(&cache_path)?;

    let group_id = match cache.group_id {
        Some(id) => {
            debug!(group_id = id, "destination group from cache");
            ChatId(id)
        }
        None => {
            let name = config.destination.sorted_group_name.clone();
            let id = driver
                .call("provisionForumGroup", || client.provision_forum_group(&name))
                .await?;
            info!(group_id = id.0, name = name.as_str(), "destination group provisioned");
            cache.group_id = Some(id.0);
            id
        }
    };

    let mut topics = BTreeMap::new();
    for keyword in &config.filter.video_matches {
        let id = match cache.topics.get(keyword) {
            Some(id) => TopicId(*id),
            None => {
                let id = driver
                    .call("provisionTopic", || client.provision_topic(group_id, keyword))
                    .await?;
                info!(topic = keyword.as_str(), topic_id = id.0, "topic provisioned");
                cache.topics.insert(keyword.clone(), id.0);
                id
            }
        };
        topics.insert(keyword.clone(), id);
    }

    cache.save(&cache_path)?;
    Ok((group_id, topics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_absent_file_is_empty_cache() {
        let dir = tempdir().unwrap();
        let cache = ForumCache::load(&dir.path().join("forum-group-cache.json")).unwrap();
        assert!(cache.group_id.is_none());
        assert!(cache.topics.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forum-group-cache.json");
        let mut cache = ForumCache::default();
        cache.group_id = Some(-100500);
        cache.topics.insert("keyword".to_string(), 12);
        cache.save(&path).unwrap();

        let loaded = ForumCache::load(&path).unwrap();
        assert_eq!(loaded.group_id, Some(-100500));
        assert_eq!(loaded.topics.get("keyword"), Some(&12));
    }

    #[test]
    fn corrupt_cache_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forum-group-cache.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(ForumCache::load(&path).is_err());
    }
}
