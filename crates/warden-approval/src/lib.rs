//! Warden Approval - Human-in-the-loop approval for agent memory writes.
//!
//! When an agent proposes to change its own memory, the change does not take
//! effect until a human has reviewed it. This crate owns that cycle:
//!
//! - [`InterruptDetector`]: turns approval-required engine actions into
//!   [`ApprovalRequest`]s and pauses their thread
//! - [`ApprovalLedger`]: durable record of every request
//! - [`DecisionHandler`]: applies approve / edit / reject exactly once
//! - [`ResumeCoordinator`]: hands the outcome back to the exact paused action
//! - [`InterruptBus`]: outbound notifications for reviewers
//!
//! # Example
//!
//! ```rust,ignore
//! let detector = InterruptDetector::new(ledger.clone(), memory.clone(), coordinator.clone(), bus.clone());
//! let handler = DecisionHandler::new(ledger, memory, coordinator, bus);
//!
//! if let Observation::Interrupted(request) = detector.observe(event).await? {
//!     // ...reviewer looks at request.proposed_content and request.flags...
//!     handler.submit(&request.agent_id, None, request.id, Decision::Approve).await?;
//! }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod detector;
mod error;
pub mod events;
pub mod gate;
pub mod handler;
pub mod ledger;
pub mod request;
pub mod resume;

pub use detector::{
    ActionEvent, ApprovalPolicy, ApprovalRequirements, EngineEvent, InterruptDetector,
    Observation, RefusalReason,
};
pub use error::{ApprovalError, ApprovalResult, DecisionError, DecisionResult, Guard};
pub use events::{DecisionSubmitted, InboundMessage, InterruptBus, InterruptEvent};
pub use gate::PausedThreads;
pub use handler::DecisionHandler;
pub use ledger::{ApprovalLedger, KvApprovalLedger, LEDGER_NAMESPACE};
pub use request::{ApprovalRequest, Decision, RequestStatus, Resolution};
pub use resume::{ExecutionEngine, ResumeCoordinator, ResumeOutcome};
