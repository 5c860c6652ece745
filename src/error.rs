//! Error types for the pipeline.
//!
//! Per-source and per-item failures are absorbed close to where they occur:
//! an adapter error becomes an empty contribution for that keyword, a failed
//! relevance fetch fails closed, a corrupt ledger snapshot loads as empty.
//! Only a missing credential for the mandatory record store halts the run.

use thiserror::Error;

/// A source adapter failed to produce results for one keyword.
///
/// Never fatal: the orchestrator logs it, counts it, and moves on.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("provider returned status {0}")]
    Status(u16),

    /// Response body did not yield any structured results.
    #[error("parse error: {0}")]
    Parse(String),
}

/// A sink call failed.
///
/// Logged and counted; never aborts the remaining sinks or the run.
#[derive(Debug, Error)]
pub enum SinkError {
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Sink API answered with an error status.
    #[error("sink API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// Sink response could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Startup configuration was incomplete.
///
/// Fatal only for the sink that needs the value: a missing record-store
/// credential stops the run, a missing notifier credential merely disables
/// notification.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential or identifier is absent.
    #[error("missing required configuration: {0}")]
    MissingCredential(&'static str),

    /// A configuration value could not be interpreted.
    #[error("invalid configuration for {name}: {reason}")]
    Invalid {
        /// Which setting.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
