//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_approval::prelude::*;` to import all essential types.

pub use crate::{
    ApprovalError, ApprovalLedger, ApprovalRequest, ApprovalResult, Decision, DecisionError,
    DecisionHandler, DecisionResult, EngineEvent, ExecutionEngine, InterruptBus, InterruptDetector,
    InterruptEvent, Observation, RequestStatus, ResumeCoordinator, ResumeOutcome,
};
