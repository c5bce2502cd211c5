//! Error types surfaced to callers.
//!
//! Almost everything inside the core degrades to a local miss: a corrupt
//! settings blob, a denied environment write or a candidate executable that
//! fails to launch are all absorbed where they happen. Only two conditions
//! propagate — a write no settings tier could accept, and a cancelled
//! discovery.

use thiserror::Error;

/// Errors reported by [`SettingsStore`](crate::settings::SettingsStore).
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Neither the typed, dynamic nor environment tier accepted the write.
    #[error("no settings tier could store key {key:?}")]
    Persistence {
        /// The key that could not be persisted.
        key: String,
    },
}

/// Errors reported by [`ToolLocator`](crate::detect::ToolLocator).
///
/// "Tool not found" is a normal outcome, not an error; callers get it as
/// `Ok(None)` so they can fall back to a manual file pick.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The caller's cancellation token fired before discovery finished.
    #[error("tool discovery was cancelled before completing")]
    Cancelled,
}
