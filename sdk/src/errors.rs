//! Error types and handling
//!
//! This module provides the error types used throughout the Waypoint engine.
//! All errors implement the `WaypointErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! Most failures inside a mission never surface as an `EngineError`: agent and
//! pricing problems are folded into labeled results. The variants here cover the
//! boundaries where a typed error is still the right answer, such as
//! configuration and plan validation.

use thiserror::Error;

/// Trait for Waypoint error extensions
///
/// Provides additional context for errors, including user-friendly hints and
/// recoverability information.
pub trait WaypointErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors typically require the configuration to be fixed first.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Mission**: Plan rejection and branch timeouts
/// - **Storage**: Note store rejections
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, WaypointErrorExt};
///
/// let error = EngineError::BranchTimeout { branch: "research".to_string(), secs: 30 };
/// assert_eq!(error.to_string(), "research branch timed out after 30s");
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::Config("bad log level".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Mission errors
    #[error("Plan invalid: {0}")]
    PlanInvalid(String),

    #[error("{branch} branch timed out after {secs}s")]
    BranchTimeout { branch: String, secs: u64 },

    // Storage errors
    #[error("Notes error: {0}")]
    Notes(String),
}

impl WaypointErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",

            Self::PlanInvalid(_) => "The planner did not produce a usable plan. Rephrase the goal",
            Self::BranchTimeout { .. } => "An agent took too long to respond. Try again",
            Self::Notes(_) => "The note store rejected the entry",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) => false,

            _ => true,
        }
    }
}
