//! Core domain types for Shift.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the workspace.

mod config;
mod convention;

pub use config::{ConfigError, Deferral, ShiftConfig, UnobservedLevel};
pub use convention::Convention;

use thiserror::Error;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Misuse of the adapter API.
///
/// Always returned synchronously from the call that violated the contract,
/// never through the result channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShiftError {
    #[error(
        "cannot determine how to call function (declares {declared} parameters, {supplied} arguments supplied)"
    )]
    UnknownConvention { declared: usize, supplied: usize },
    #[error("callback delivery requires a running tokio runtime")]
    NoRuntime,
    #[error("call(...) : callback at position {position} is not the last argument")]
    MisplacedCallback { position: usize },
}

// ============================================================================
// Operational Faults
// ============================================================================

/// Failures produced by the adapter itself while running a source.
///
/// These travel the failure channel like any error the source raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceFault {
    #[error("source panicked: {0}")]
    Panicked(String),
    #[error("source dropped its continuation without settling")]
    Abandoned,
}

impl SourceFault {
    /// Build a `Panicked` fault from a `catch_unwind` payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        Self::Panicked(panic_message(payload))
    }
}

/// Extract the message from a `catch_unwind` payload.
#[must_use]
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
