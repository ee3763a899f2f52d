//! Application driving: step state machine, session state, outcomes

mod engine;
mod outcome;
mod session;

pub use engine::{ApplyEngine, Collaborators, EngineConfig};
pub use outcome::classify;
pub use session::{ApplicationSession, FailureReason, SessionStats, SessionStatus};
