//! Waypoint SDK
//!
//! Shared library providing the mission data model and error types.
//! This crate is used by the engine and by anything consuming a mission stream.

/// Error types and handling
pub mod errors;

/// Mission data model
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, WaypointErrorExt};
pub use types::{
    AgentOutput, AgentResult, BranchLabel, BudgetResult, DayCost, JsonMap, MissionEvent, Money,
    Plan, PricedComponent,
};
