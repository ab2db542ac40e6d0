//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// The two auctionable task kinds against a tracked target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Surveil and confirm the target.
    Monitor,
    /// Engage the target.
    Attack,
}

/// Shared lifecycle state of one task kind on one tracked target.
///
/// Transitions: NoTask → Open (first bid, or confirm expiry for attack),
/// Open → EnRoute (claim), EnRoute → Performing (arrival), Performing →
/// Complete (resolution). An external release returns any non-terminal
/// state to Open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// No agent has ever bid on this task.
    #[default]
    NoTask,
    /// Available for bids.
    Open,
    /// Claimed; the owner is flying to the target.
    EnRoute,
    /// The owner is on station performing the task.
    Performing,
    /// Terminal: the task finished.
    Complete,
}

impl TaskState {
    /// Whether the task has reached its terminal state.
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskState::Complete)
    }
}
