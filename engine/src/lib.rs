//! Waypoint Engine Library
//!
//! This library provides the core functionality of the Waypoint engine.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// LLM provider abstraction layer
pub mod llm;

/// Response normalization
pub mod normalizer;

/// Agent calling conventions and invocation
pub mod agents;

/// Price lookups and currency conversion
pub mod pricing;

/// Budget calculation
pub mod budget;

/// Note store
pub mod notes;

/// Mission orchestration
pub mod mission;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
