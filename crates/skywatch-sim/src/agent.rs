//! Per-agent state: belief, registry, local task machine, pathing, and
//! bookkeeping the tick sequence needs.

use skywatch_belief::{GridBelief, TargetRegistry};
use skywatch_core::enums::TaskKind;
use skywatch_core::types::{AgentId, TargetId};
use skywatch_tasking::{AgentCapabilities, AgentTask};

use crate::pathing::WaypointPather;

/// Outcome of a weapon release, held until the BDA stare finishes.
#[derive(Debug, Clone, Copy)]
pub struct PendingStrike {
    pub target: TargetId,
    pub killed: bool,
}

/// One autonomous agent.
pub struct Agent {
    pub id: AgentId,
    pub capabilities: AgentCapabilities,
    pub grid: GridBelief,
    pub registry: TargetRegistry,
    pub task: AgentTask,
    pub pather: WaypointPather,
    /// Last tick each grid cell was inside this agent's footprint
    /// (row-major). Drives search staleness tie-breaking.
    pub coverage: Vec<u64>,
    /// Strike result awaiting battle damage assessment.
    pub pending_strike: Option<PendingStrike>,
}

impl Agent {
    /// The shared task kind this agent's local machine is serving, for the
    /// auction's re-bid path. Confirm rides the monitor task; BDA rides
    /// the attack task.
    pub fn held_task(&self) -> Option<(TaskKind, TargetId)> {
        match self.task {
            AgentTask::Search { .. } => None,
            AgentTask::Monitor { target, .. } | AgentTask::Confirm { target, .. } => {
                Some((TaskKind::Monitor, target))
            }
            AgentTask::Attack { target, .. } | AgentTask::Bda { target, .. } => {
                Some((TaskKind::Attack, target))
            }
        }
    }
}
