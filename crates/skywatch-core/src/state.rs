//! Swarm state snapshot — the observable state produced after each tick.

use serde::{Deserialize, Serialize};

use crate::events::SwarmEvent;
use crate::types::{AgentId, Coordinate, SimTime, TargetId, TargetType};

/// Complete observable state built after each tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwarmSnapshot {
    pub time: SimTime,
    pub agents: Vec<AgentView>,
    pub targets: Vec<TargetTruthView>,
    pub events: Vec<SwarmEvent>,
}

/// One agent's externally visible state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentView {
    pub agent_id: AgentId,
    pub position: Coordinate,
    /// Heading in degrees (0 = North, clockwise).
    pub heading_deg: f64,
    /// Current local task.
    pub task: TaskView,
    /// Number of targets in this agent's registry.
    pub tracked_targets: usize,
    /// Mean cell uncertainty across this agent's belief grid.
    pub mean_uncertainty: f64,
    /// Total weapon rounds remaining across stations.
    pub weapon_rounds: u32,
}

/// Compact description of an agent's local task for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaskView {
    #[default]
    Search,
    Monitor {
        target: TargetId,
    },
    Confirm {
        target: TargetId,
    },
    Attack {
        target: TargetId,
    },
    Bda {
        target: TargetId,
    },
}

/// Ground-truth target state (viewer-side; agents never read this).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetTruthView {
    pub target_id: TargetId,
    pub target_type: TargetType,
    pub position: Coordinate,
    pub heading_deg: f64,
    pub destroyed: bool,
}
