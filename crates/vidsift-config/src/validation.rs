// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as the non-empty match list and ordered bounds.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::VidsiftConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with all collected validation errors (does not fail fast).
pub fn validate_config(config: &VidsiftConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // The match list determines the destination topics; an empty list
    // makes the whole run meaningless and is fatal at startup.
    if config
        .filter
        .video_matches
        .iter()
        .all(|m| m.trim().is_empty())
    {
        errors.push(ConfigError::Validation {
            message: "filter.video_matches must contain at least one non-empty keyword"
                .to_string(),
        });
    }

    let mut seen = HashSet::new();
    for keyword in &config.filter.video_matches {
        if !seen.insert(keyword.trim().to_lowercase()) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate match keyword `{}`", keyword.trim()),
            });
        }
    }

    if config.destination.sorted_group_name.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "destination.sorted_group_name must not be empty".to_string(),
        });
    }

    if config.storage.data_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.data_dir must not be empty".to_string(),
        });
    }

    if let Some(max) = config.filter.max_video_duration_secs
        && max < config.filter.min_video_duration_secs
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "filter.max_video_duration_secs ({max}) is below min_video_duration_secs ({})",
                config.filter.min_video_duration_secs
            ),
        });
    }

    if let (Some(min), Some(max)) = (config.filter.min_file_size_mb, config.filter.max_file_size_mb)
        && max < min
    {
        errors.push(ConfigError::Validation {
            message: format!("filter.max_file_size_mb ({max}) is below min_file_size_mb ({min})"),
        });
    }

    for (name, value) in [
        ("filter.min_file_size_mb", config.filter.min_file_size_mb),
        ("filter.max_file_size_mb", config.filter.max_file_size_mb),
    ] {
        if let Some(v) = value
            && v < 0.0
        {
            errors.push(ConfigError::Validation {
                message: format!("{name} must be non-negative, got {v}"),
            });
        }
    }

    for (name, value) in [
        (
            "dedup.file_size_tolerance_percent",
            config.dedup.file_size_tolerance_percent,
        ),
        (
            "dedup.resolution_tolerance_percent",
            config.dedup.resolution_tolerance_percent,
        ),
    ] {
        if !(0.0..=100.0).contains(&value) {
            errors.push(ConfigError::Validation {
                message: format!("{name} must be within 0..=100, got {value}"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
