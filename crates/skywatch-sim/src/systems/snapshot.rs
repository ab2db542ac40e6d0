//! Snapshot building: the complete observable state after each tick.

use hecs::World;

use skywatch_core::events::SwarmEvent;
use skywatch_core::state::{AgentView, SwarmSnapshot, TargetTruthView, TaskView};
use skywatch_core::types::{Coordinate, SimTime};
use skywatch_tasking::AgentTask;

use crate::agent::Agent;
use crate::truth::{TruthTarget, TruthVelocity};

/// Build the snapshot for the tick that just completed.
pub fn build(
    world: &World,
    agents: &[Agent],
    time: SimTime,
    events: Vec<SwarmEvent>,
) -> SwarmSnapshot {
    let agent_views = agents
        .iter()
        .map(|agent| AgentView {
            agent_id: agent.id,
            position: agent.pather.current_coordinate(),
            heading_deg: agent.pather.current_heading_deg(),
            task: task_view(&agent.task),
            tracked_targets: agent.registry.len(),
            mean_uncertainty: agent.grid.mean_uncertainty(),
            weapon_rounds: agent.capabilities.total_rounds(),
        })
        .collect();

    let mut targets: Vec<TargetTruthView> = {
        let mut query = world.query::<(&TruthTarget, &Coordinate, &TruthVelocity)>();
        query
            .iter()
            .map(|(_entity, (target, pos, vel))| TargetTruthView {
                target_id: target.id,
                target_type: target.ttype,
                position: *pos,
                heading_deg: vel.heading_deg(),
                destroyed: target.destroyed,
            })
            .collect()
    };
    targets.sort_by_key(|t| t.target_id);

    SwarmSnapshot {
        time,
        agents: agent_views,
        targets,
        events,
    }
}

fn task_view(task: &AgentTask) -> TaskView {
    match *task {
        AgentTask::Search { .. } => TaskView::Search,
        AgentTask::Monitor { target, .. } => TaskView::Monitor { target },
        AgentTask::Confirm { target, .. } => TaskView::Confirm { target },
        AgentTask::Attack { target, .. } => TaskView::Attack { target },
        AgentTask::Bda { target, .. } => TaskView::Bda { target },
    }
}
