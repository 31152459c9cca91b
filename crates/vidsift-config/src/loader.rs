// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading.
//!
//! Every entry point builds on the same Figment stack: compiled defaults
//! at the bottom, TOML sources in increasing order of specificity, and
//! `VIDSIFT_*` environment variables on top so a deployment can override
//! any single key without editing files.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::VidsiftConfig;

/// Config sections, used to turn env var names into dotted keys.
const SECTIONS: [&str; 5] = ["destination", "filter", "run", "storage", "dedup"];

/// Load configuration from the standard lookup locations.
///
/// TOML files are consulted from system-wide to local, so
/// `./vidsift.toml` beats the user's XDG file, which beats
/// `/etc/vidsift/vidsift.toml`; environment variables beat them all.
pub fn load_config() -> Result<VidsiftConfig, figment::Error> {
    let mut figment = defaults();
    for path in lookup_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_overrides()).extract()
}

/// Load configuration from one explicit file, skipping the standard
/// lookup locations. Environment overrides still apply.
pub fn load_config_from_path(path: &Path) -> Result<VidsiftConfig, figment::Error> {
    defaults()
        .merge(Toml::file(path))
        .merge(env_overrides())
        .extract()
}

/// Load configuration from a TOML string alone. No files, no
/// environment; meant for tests.
pub fn load_config_from_str(toml_content: &str) -> Result<VidsiftConfig, figment::Error> {
    defaults().merge(Toml::string(toml_content)).extract()
}

/// The bottom layer of every stack: the compiled-in defaults.
fn defaults() -> Figment {
    Figment::from(Serialized::defaults(VidsiftConfig::default()))
}

/// Standard TOML locations, least specific first. Missing files are
/// fine; Figment treats them as empty.
fn lookup_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/vidsift/vidsift.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("vidsift/vidsift.toml"));
    }
    paths.push(PathBuf::from("vidsift.toml"));
    paths
}

/// Environment overrides with the `VIDSIFT_` prefix.
///
/// Only the leading section name becomes a dot: `VIDSIFT_RUN_MAX_FORWARDS`
/// maps to `run.max_forwards`. Splitting on every underscore would
/// mangle keys whose names themselves contain underscores, which is
/// nearly all of them.
fn env_overrides() -> Env {
    Env::prefixed("VIDSIFT_").map(|key| {
        let lower = key.as_str().to_ascii_lowercase();
        for section in SECTIONS {
            if let Some(rest) = lower.strip_prefix(section)
                && let Some(rest) = rest.strip_prefix('_')
            {
                return format!("{section}.{rest}").into();
            }
        }
        lower.into()
    })
}
