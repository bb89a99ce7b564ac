//! Orchestration layer for the CIQ Copilot.
//!
//! Wires the session store, blueprint context, intent classification and
//! the external capabilities into the turn-processing state machine
//! consumed by whatever boundary layer (HTTP, CLI) sits on top.

pub mod assistant;
pub mod context;
pub mod merge_service;

pub use assistant::{CiqAssistant, TurnOutcome};
pub use context::BlueprintContext;
pub use merge_service::MergeService;
