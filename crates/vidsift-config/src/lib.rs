// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loading, modeling, and validation for vidsift.
//!
//! Layered TOML + environment configuration via Figment, strict unknown-key
//! rejection, and a collect-all-errors validation pass.

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{format_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    DedupConfig, DestinationConfig, FilterConfig, RunConfig, StorageConfig, VidsiftConfig,
};
pub use validation::validate_config;
