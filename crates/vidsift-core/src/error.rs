// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the vidsift ingestion pipeline.

use thiserror::Error;

/// An error surfaced by a single upstream chat RPC.
///
/// Carries the protocol's error shape (`message`, numeric `code`, optional
/// flood-wait `seconds` hint) so the rate-limit driver can classify it
/// without knowing anything about the transport behind [`ChatClient`].
///
/// [`ChatClient`]: crate::client::ChatClient
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RpcError {
    /// Protocol error message (e.g. `FLOOD_WAIT`).
    pub message: String,
    /// Protocol error code, when the transport exposes one.
    pub code: Option<i32>,
    /// Required quiet period in seconds, present on flood-wait errors.
    pub seconds: Option<u64>,
    /// Whether this was a transport-level failure (timeout, reset) rather
    /// than a protocol-signaled error.
    pub network: bool,
    /// Underlying transport error, when available.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RpcError {
    /// A protocol-signaled rate limit carrying a quiet-period hint.
    pub fn flood_wait(seconds: u64) -> Self {
        Self {
            message: "FLOOD_WAIT".to_string(),
            code: Some(420),
            seconds: Some(seconds),
            network: false,
            source: None,
        }
    }

    /// A transport-level failure (connection reset, timeout, DNS).
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            seconds: None,
            network: true,
            source: None,
        }
    }

    /// Any other protocol error.
    pub fn other(message: impl Into<String>, code: Option<i32>) -> Self {
        Self {
            message: message.into(),
            code,
            seconds: None,
            network: false,
            source: None,
        }
    }

    /// True when the error is a flood-wait with an authoritative wait hint.
    pub fn is_flood_wait(&self) -> bool {
        (self.message == "FLOOD_WAIT" || self.code == Some(420)) && self.seconds.is_some()
    }

    /// True when the error is worth an exponential-backoff retry: a 420
    /// without an explicit wait hint, or a generic network failure.
    pub fn is_transient(&self) -> bool {
        self.network || (self.code == Some(420) && self.seconds.is_none())
    }
}

/// The primary error type used across the vidsift workspace.
#[derive(Debug, Error)]
pub enum VidsiftError {
    /// Configuration errors (invalid TOML, missing required fields,
    /// semantic validation failures).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database open, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An upstream RPC failed after the retry budget was exhausted, or
    /// failed with a non-retryable error.
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    /// File errors on the sidecar state files (audit log, forum cache).
    #[error("{message}: {source}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flood_wait_classification() {
        let err = RpcError::flood_wait(7);
        assert!(err.is_flood_wait());
        assert!(!err.is_transient());
        assert_eq!(err.seconds, Some(7));
    }

    #[test]
    fn bare_420_is_transient_not_flood_wait() {
        let err = RpcError::other("Too Many Requests", Some(420));
        assert!(!err.is_flood_wait());
        assert!(err.is_transient());
    }

    #[test]
    fn network_error_is_transient() {
        let err = RpcError::network("connection reset by peer");
        assert!(err.is_transient());
        assert!(!err.is_flood_wait());
    }

    #[test]
    fn other_error_is_fatal() {
        let err = RpcError::other("CHAT_WRITE_FORBIDDEN", Some(403));
        assert!(!err.is_flood_wait());
        assert!(!err.is_transient());
    }

    #[test]
    fn flood_wait_by_message_without_code() {
        let err = RpcError {
            message: "FLOOD_WAIT".to_string(),
            code: None,
            seconds: Some(2),
            network: false,
            source: None,
        };
        assert!(err.is_flood_wait());
    }

    #[test]
    fn rpc_error_converts_into_vidsift_error() {
        let err: VidsiftError = RpcError::flood_wait(1).into();
        assert!(matches!(err, VidsiftError::Rpc(_)));
    }
}
