// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed configuration errors surfaced to the CLI.

use thiserror::Error;

/// A configuration error with enough context to print an actionable
/// message.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be loaded or parsed.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A semantic validation failure on a loaded value.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Render a batch of validation errors as one multi-line message.
pub fn format_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_errors_lists_each_message() {
        let errors = vec![
            ConfigError::Validation {
                message: "first".to_string(),
            },
            ConfigError::Validation {
                message: "second".to_string(),
            },
        ];
        let rendered = format_errors(&errors);
        assert!(rendered.contains("first"));
        assert!(rendered.contains("second"));
        assert_eq!(rendered.lines().count(), 2);
    }
}
