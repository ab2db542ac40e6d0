//! Belief snapshot: the payload an agent broadcasts to the rest of the
//! swarm.

use serde::{Deserialize, Serialize};

use skywatch_core::types::AgentId;

use crate::grid::GridBelief;
use crate::registry::{TargetBelief, TargetRegistry};

/// One agent's belief, captured for broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefSnapshot {
    /// Originating agent.
    pub agent_id: AgentId,
    /// Capture timestamp (simulation seconds).
    pub time: f64,
    pub grid: GridBelief,
    pub targets: Vec<TargetBelief>,
}

impl BeliefSnapshot {
    pub fn capture(
        agent_id: AgentId,
        time: f64,
        grid: &GridBelief,
        registry: &TargetRegistry,
    ) -> Self {
        Self {
            agent_id,
            time,
            grid: grid.clone(),
            targets: registry.iter().cloned().collect(),
        }
    }
}
