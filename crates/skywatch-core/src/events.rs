//! Events emitted by the simulation for external consumers.

use serde::{Deserialize, Serialize};

use crate::enums::TaskKind;
use crate::types::{AgentId, TargetId};

/// Notable occurrences within one tick, collected into the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SwarmEvent {
    /// An agent promoted a cell detection into a tracked target.
    ContactTracked { agent: AgentId, target: TargetId },
    /// An agent won a task auction.
    TaskClaimed {
        agent: AgentId,
        target: TargetId,
        kind: TaskKind,
        score: f64,
    },
    /// An agent lost a task it held (outbid or externally cleared).
    TaskLost {
        agent: AgentId,
        target: TargetId,
        kind: TaskKind,
    },
    /// A weapon release was resolved against a target.
    AttackResolved { target: TargetId, destroyed: bool },
    /// A target was destroyed.
    TargetDestroyed { target: TargetId },
}
