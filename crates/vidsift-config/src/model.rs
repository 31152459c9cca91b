// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the vidsift ingestion agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level vidsift configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values, except that an empty `filter.video_matches` fails validation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VidsiftConfig {
    /// Destination forum-group settings.
    #[serde(default)]
    pub destination: DestinationConfig,

    /// Keyword matching and metadata bounds.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Run behavior: sources, caps, dry-run.
    #[serde(default)]
    pub run: RunConfig,

    /// Persistent state location.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Duplicate-detection policy.
    #[serde(default)]
    pub dedup: DedupConfig,
}

/// Destination forum-group settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationConfig {
    /// Display name of the destination chat the provisioner creates or
    /// finds.
    #[serde(default = "default_sorted_group_name")]
    pub sorted_group_name: String,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            sorted_group_name: default_sorted_group_name(),
        }
    }
}

fn default_sorted_group_name() -> String {
    "Sorted Videos".to_string()
}

/// Keyword matching and metadata bounds applied to candidate videos.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Match keywords; each keyword names one destination topic. Must be
    /// non-empty.
    #[serde(default)]
    pub video_matches: Vec<String>,

    /// Exclusion substrings; any hit disqualifies a message.
    #[serde(default)]
    pub video_exclusions: Vec<String>,

    /// Minimum video duration in seconds.
    #[serde(default)]
    pub min_video_duration_secs: u32,

    /// Optional maximum video duration in seconds.
    #[serde(default)]
    pub max_video_duration_secs: Option<u32>,

    /// Optional minimum file size in megabytes.
    #[serde(default)]
    pub min_file_size_mb: Option<f64>,

    /// Optional maximum file size in megabytes.
    #[serde(default)]
    pub max_file_size_mb: Option<f64>,
}

/// Run behavior settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Source chat ids to scan. Empty means every accessible group and
    /// channel.
    #[serde(default)]
    pub source_groups: Vec<i64>,

    /// Per-run cap on source messages forwarded, across all sources.
    #[serde(default = "default_max_forwards")]
    pub max_forwards: u64,

    /// Skip all destructive RPCs (forwards and deletes) while still
    /// recording message progress.
    #[serde(default)]
    pub dry_run: bool,

    /// Disable the pre-run cleanup sweep of the destination.
    #[serde(default)]
    pub skip_cleanup: bool,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            source_groups: Vec::new(),
            max_forwards: default_max_forwards(),
            dry_run: false,
            skip_cleanup: false,
            log_level: default_log_level(),
        }
    }
}

fn default_max_forwards() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Persistent state location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding the database and sidecar state files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "./data".to_string()
}

impl StorageConfig {
    /// Path of the processed-state database.
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("processed-messages.db")
    }

    /// Path of the forum group/topic id cache.
    pub fn forum_cache_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("forum-group-cache.json")
    }

    /// Path of the append-only forward audit log.
    pub fn audit_log_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("forwarding-log.json")
    }

    /// Legacy plaintext state files migrated once on first open, in
    /// (messages, videos, metadata) order.
    pub fn legacy_paths(&self) -> (PathBuf, PathBuf, PathBuf) {
        let dir = PathBuf::from(&self.data_dir);
        (
            dir.join("processed-messages.txt"),
            dir.join("processed-messages-videos.txt"),
            dir.join("processed-messages-metadata.json"),
        )
    }
}

/// Duplicate-detection policy: which metadata checks are enabled and their
/// tolerances.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DedupConfig {
    /// Compare durations of candidate and stored video.
    #[serde(default)]
    pub check_duration: bool,

    /// Absolute duration tolerance in seconds.
    #[serde(default = "default_duration_tolerance_secs")]
    pub duration_tolerance_secs: u32,

    /// Compare file sizes.
    #[serde(default)]
    pub check_file_size: bool,

    /// Relative size tolerance in percent.
    #[serde(default = "default_file_size_tolerance_percent")]
    pub file_size_tolerance_percent: f64,

    /// Compare resolutions (pixel area).
    #[serde(default)]
    pub check_resolution: bool,

    /// Relative resolution tolerance in percent.
    #[serde(default = "default_resolution_tolerance_percent")]
    pub resolution_tolerance_percent: f64,

    /// Compare MIME types (case-insensitive equality).
    #[serde(default)]
    pub check_mime_type: bool,

    /// Derive dedup keys by token-stripping normalization; when false the
    /// key is the lowercased filename verbatim.
    #[serde(default = "default_normalize_filenames")]
    pub normalize_filenames: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            check_duration: false,
            duration_tolerance_secs: default_duration_tolerance_secs(),
            check_file_size: false,
            file_size_tolerance_percent: default_file_size_tolerance_percent(),
            check_resolution: false,
            resolution_tolerance_percent: default_resolution_tolerance_percent(),
            check_mime_type: false,
            normalize_filenames: default_normalize_filenames(),
        }
    }
}

impl DedupConfig {
    /// True when at least one metadata check is enabled.
    pub fn any_check_enabled(&self) -> bool {
        self.check_duration || self.check_file_size || self.check_resolution || self.check_mime_type
    }
}

fn default_duration_tolerance_secs() -> u32 {
    30
}

fn default_file_size_tolerance_percent() -> f64 {
    5.0
}

fn default_resolution_tolerance_percent() -> f64 {
    10.0
}

fn default_normalize_filenames() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = VidsiftConfig::default();
        assert_eq!(config.run.max_forwards, 100);
        assert!(!config.run.dry_run);
        assert!(!config.run.skip_cleanup);
        assert_eq!(config.dedup.duration_tolerance_secs, 30);
        assert_eq!(config.dedup.file_size_tolerance_percent, 5.0);
        assert_eq!(config.dedup.resolution_tolerance_percent, 10.0);
        assert!(config.dedup.normalize_filenames);
        assert!(!config.dedup.any_check_enabled());
    }

    #[test]
    fn storage_paths_derive_from_data_dir() {
        let storage = StorageConfig {
            data_dir: "/var/lib/vidsift".to_string(),
        };
        assert_eq!(
            storage.database_path(),
            PathBuf::from("/var/lib/vidsift/processed-messages.db")
        );
        assert_eq!(
            storage.forum_cache_path(),
            PathBuf::from("/var/lib/vidsift/forum-group-cache.json")
        );
        assert_eq!(
            storage.audit_log_path(),
            PathBuf::from("/var/lib/vidsift/forwarding-log.json")
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml_str = r#"
[filter]
video_matches = ["keyword"]
video_machtes = ["typo"]
"#;
        assert!(toml::from_str::<VidsiftConfig>(toml_str).is_err());
    }

    #[test]
    fn full_config_deserializes() {
        let toml_str = r#"
[destination]
sorted_group_name = "My Sorted Videos"

[filter]
video_matches = ["cooking", "travel"]
video_exclusions = ["preview"]
min_video_duration_secs = 300
max_video_duration_secs = 7200
min_file_size_mb = 10.0

[run]
source_groups = [-1001, -1002]
max_forwards = 25
dry_run = true

[dedup]
check_duration = true
duration_tolerance_secs = 15
"#;
        let config: VidsiftConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.destination.sorted_group_name, "My Sorted Videos");
        assert_eq!(config.filter.video_matches, vec!["cooking", "travel"]);
        assert_eq!(config.filter.max_video_duration_secs, Some(7200));
        assert_eq!(config.run.source_groups, vec![-1001, -1002]);
        assert_eq!(config.run.max_forwards, 25);
        assert!(config.run.dry_run);
        assert!(config.dedup.check_duration);
        assert_eq!(config.dedup.duration_tolerance_secs, 15);
        assert!(config.dedup.any_check_enabled());
    }
}
