//! Task execution state machines.
//!
//! Pure functions that compute state transitions and routing/staring
//! directives for one agent's current task. The machines never touch the
//! registry themselves; the two shared writes they are allowed (the
//! confirm-expiry attack opening and the focused-scan flag) come back as
//! `TaskEffect`s for the engine to apply.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use skywatch_belief::registry::TargetRegistry;
use skywatch_belief::GridBelief;
use skywatch_core::constants::*;
use skywatch_core::enums::TaskState;
use skywatch_core::types::{heading_unit_vector, Coordinate, GridCell, GridFrame, TargetId};

/// Progress of a monitor task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MonitorLeg {
    /// Flying toward the believed target location.
    EnRoute,
    /// Circling the stand-off orbit anchored at the believed location at
    /// entry time.
    Orbiting { anchor: Coordinate },
}

/// Progress of an attack task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttackLeg {
    EnRoute,
    Performing,
}

/// The agent's local task. Not shared with other agents — only the
/// registry's Task Status records are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AgentTask {
    Search {
        cell: Option<GridCell>,
        /// Seconds spent staring at the selected cell.
        dwell_secs: f64,
    },
    Monitor {
        target: TargetId,
        leg: MonitorLeg,
    },
    Confirm {
        target: TargetId,
        stare_secs: f64,
    },
    Attack {
        target: TargetId,
        leg: AttackLeg,
    },
    Bda {
        target: TargetId,
        stare_secs: f64,
    },
}

impl Default for AgentTask {
    fn default() -> Self {
        AgentTask::Search {
            cell: None,
            dwell_secs: 0.0,
        }
    }
}

impl AgentTask {
    /// The target this task serves, if any.
    pub fn target(&self) -> Option<TargetId> {
        match *self {
            AgentTask::Search { .. } => None,
            AgentTask::Monitor { target, .. }
            | AgentTask::Confirm { target, .. }
            | AgentTask::Attack { target, .. }
            | AgentTask::Bda { target, .. } => Some(target),
        }
    }
}

/// A stand-off orbit circle, approximated by the pather as a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitCircle {
    pub center: Coordinate,
    pub radius: f64,
}

/// Routing/staring instruction for the pathing and sensor collaborators.
/// `None` in a `TaskUpdate` means "keep flying the current plan".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Directive {
    RouteTo(Coordinate),
    Orbit {
        circle: OrbitCircle,
        edges: usize,
        clockwise: bool,
    },
    Stare(Coordinate),
}

/// Shared-state writes the engine applies on the machine's behalf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskEffect {
    SetFocusedScan { target: TargetId, on: bool },
    /// Confirm stare expired: open the target's attack task
    /// (and record the monitor task complete).
    OpenAttack { target: TargetId },
    /// The monitor owner reached its orbit.
    MonitorArrived { target: TargetId },
    /// The attack owner reached release range.
    AttackArrived { target: TargetId },
    /// Release a weapon at the target; the engine resolves the outcome.
    ReleaseWeapon { target: TargetId },
    /// BDA stare expired; the engine decides destroyed vs. re-attack.
    BdaComplete { target: TargetId },
}

/// Result of evaluating the state machine for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskUpdate {
    pub task: AgentTask,
    pub directive: Option<Directive>,
    pub effects: Vec<TaskEffect>,
}

/// Input to the state machines for one agent and one tick.
pub struct TaskContext<'a> {
    pub position: Coordinate,
    /// Current heading, degrees (0 = North, clockwise).
    pub heading_deg: f64,
    pub max_sensor_range: f64,
    /// Seconds elapsed since the previous evaluation.
    pub dt: f64,
    pub frame: &'a GridFrame,
    pub grid: &'a GridBelief,
    pub registry: &'a TargetRegistry,
    /// Last tick each grid cell was scanned (row-major), for search
    /// staleness tie-breaking. Empty slice disables the tie-break.
    pub coverage: &'a [u64],
}

/// Evaluate the state machine for one tick.
pub fn evaluate(ctx: &TaskContext, task: &AgentTask) -> TaskUpdate {
    match *task {
        AgentTask::Search { cell, dwell_secs } => evaluate_search(ctx, cell, dwell_secs),
        AgentTask::Monitor { target, leg } => evaluate_monitor(ctx, target, leg),
        AgentTask::Confirm { target, stare_secs } => evaluate_confirm(ctx, target, stare_secs),
        AgentTask::Attack { target, leg } => evaluate_attack(ctx, target, leg),
        AgentTask::Bda { target, stare_secs } => evaluate_bda(ctx, target, stare_secs),
    }
}

/// Pick the next search cell: maximum uncertainty, staleness (oldest
/// coverage) breaking ties, row-major breaking the rest.
pub fn select_search_cell(grid: &GridBelief, coverage: &[u64]) -> GridCell {
    let mut best = GridCell::new(0, 0);
    let mut best_u = f64::NEG_INFINITY;
    let mut best_age = 0u64;
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let cell = GridCell::new(row, col);
            let u = grid.uncertainty(cell);
            let age = coverage
                .get(row * grid.cols() + col)
                .copied()
                .unwrap_or(0);
            let better = u > best_u || (u == best_u && age < best_age);
            if better {
                best_u = u;
                best_age = age;
                best = cell;
            }
        }
    }
    best
}

fn evaluate_search(ctx: &TaskContext, cell: Option<GridCell>, dwell_secs: f64) -> TaskUpdate {
    // Keep the current cell while it is still worth staring at.
    if let Some(c) = cell {
        let worth_it = ctx.grid.uncertainty(c) >= SEARCH_RESELECT_UNCERTAINTY
            && dwell_secs < SEARCH_DWELL_SECS;
        if worth_it {
            let center = ctx.frame.center_of(c);
            let close = ctx.position.distance_to(&center) <= ctx.max_sensor_range;
            return TaskUpdate {
                task: AgentTask::Search {
                    cell: Some(c),
                    dwell_secs: if close { dwell_secs + ctx.dt } else { dwell_secs },
                },
                directive: Some(if close {
                    Directive::Stare(center)
                } else {
                    Directive::RouteTo(center)
                }),
                effects: Vec::new(),
            };
        }
    }

    let next = select_search_cell(ctx.grid, ctx.coverage);
    TaskUpdate {
        task: AgentTask::Search {
            cell: Some(next),
            dwell_secs: 0.0,
        },
        directive: Some(Directive::RouteTo(ctx.frame.center_of(next))),
        effects: Vec::new(),
    }
}

/// Orbit direction from the 2-D cross product of the center-to-entry
/// vector and the entry heading: a positive cross product means the
/// heading sweeps counter-clockwise around the center, so the orbit
/// continues that way; otherwise clockwise.
pub fn orbit_direction_clockwise(center: Coordinate, entry: Coordinate, heading_deg: f64) -> bool {
    let radial: DVec2 = entry.as_dvec2() - center.as_dvec2();
    let heading = heading_unit_vector(heading_deg);
    radial.perp_dot(heading) < 0.0
}

fn orbit_update(ctx: &TaskContext, target: TargetId, believed: Coordinate) -> TaskUpdate {
    let circle = OrbitCircle {
        center: believed,
        radius: ORBIT_STANDOFF_FRACTION * ctx.max_sensor_range,
    };
    TaskUpdate {
        task: AgentTask::Monitor {
            target,
            leg: MonitorLeg::Orbiting { anchor: believed },
        },
        directive: Some(Directive::Orbit {
            circle,
            edges: ORBIT_EDGE_COUNT,
            clockwise: orbit_direction_clockwise(believed, ctx.position, ctx.heading_deg),
        }),
        effects: Vec::new(),
    }
}

fn revert_to_search() -> TaskUpdate {
    TaskUpdate {
        task: AgentTask::default(),
        directive: None,
        effects: Vec::new(),
    }
}

fn evaluate_monitor(ctx: &TaskContext, target: TargetId, leg: MonitorLeg) -> TaskUpdate {
    let Some(belief) = ctx.registry.get(target) else {
        return revert_to_search();
    };
    if belief.destroyed {
        return revert_to_search();
    }
    let believed = belief.position;
    let distance = ctx.position.distance_to(&believed);

    match leg {
        MonitorLeg::EnRoute => {
            if distance <= ORBIT_ENTRY_FRACTION * ctx.max_sensor_range {
                let mut update = orbit_update(ctx, target, believed);
                update.effects.push(TaskEffect::MonitorArrived { target });
                return update;
            }
            TaskUpdate {
                task: AgentTask::Monitor {
                    target,
                    leg: MonitorLeg::EnRoute,
                },
                directive: Some(Directive::RouteTo(believed)),
                effects: Vec::new(),
            }
        }
        MonitorLeg::Orbiting { anchor } => {
            // Re-route once the believed location drifts off the anchor.
            if believed.distance_to(&anchor) > MONITOR_REROUTE_FRACTION * ctx.max_sensor_range {
                return orbit_update(ctx, target, believed);
            }
            // Begin confirming once on station, if nobody has yet.
            if belief.attack.state == TaskState::NoTask && distance <= ctx.max_sensor_range {
                return TaskUpdate {
                    task: AgentTask::Confirm {
                        target,
                        stare_secs: 0.0,
                    },
                    directive: None,
                    effects: vec![TaskEffect::SetFocusedScan { target, on: true }],
                };
            }
            TaskUpdate {
                task: AgentTask::Monitor {
                    target,
                    leg: MonitorLeg::Orbiting { anchor },
                },
                directive: None,
                effects: Vec::new(),
            }
        }
    }
}

fn evaluate_confirm(ctx: &TaskContext, target: TargetId, stare_secs: f64) -> TaskUpdate {
    let Some(belief) = ctx.registry.get(target) else {
        let mut update = revert_to_search();
        update
            .effects
            .push(TaskEffect::SetFocusedScan { target, on: false });
        return update;
    };
    if belief.destroyed {
        let mut update = revert_to_search();
        update
            .effects
            .push(TaskEffect::SetFocusedScan { target, on: false });
        return update;
    }

    let elapsed = stare_secs + ctx.dt;
    if elapsed >= CONFIRM_STARE_SECS {
        // The one shared Task Status transition the machines own:
        // confirm expiry opens the attack.
        return TaskUpdate {
            task: AgentTask::Monitor {
                target,
                leg: MonitorLeg::Orbiting {
                    anchor: belief.position,
                },
            },
            directive: None,
            effects: vec![
                TaskEffect::SetFocusedScan { target, on: false },
                TaskEffect::OpenAttack { target },
            ],
        };
    }

    TaskUpdate {
        task: AgentTask::Confirm {
            target,
            stare_secs: elapsed,
        },
        directive: Some(Directive::Stare(belief.position)),
        effects: Vec::new(),
    }
}

fn evaluate_attack(ctx: &TaskContext, target: TargetId, leg: AttackLeg) -> TaskUpdate {
    let Some(belief) = ctx.registry.get(target) else {
        return revert_to_search();
    };
    if belief.destroyed {
        return revert_to_search();
    }
    let believed = belief.position;

    match leg {
        AttackLeg::EnRoute => {
            let distance = ctx.position.distance_to(&believed);
            if distance <= WEAPON_RELEASE_FRACTION * ctx.max_sensor_range {
                return TaskUpdate {
                    task: AgentTask::Attack {
                        target,
                        leg: AttackLeg::Performing,
                    },
                    directive: None,
                    effects: vec![TaskEffect::AttackArrived { target }],
                };
            }
            TaskUpdate {
                task: AgentTask::Attack {
                    target,
                    leg: AttackLeg::EnRoute,
                },
                directive: Some(Directive::RouteTo(believed)),
                effects: Vec::new(),
            }
        }
        AttackLeg::Performing => TaskUpdate {
            task: AgentTask::Bda {
                target,
                stare_secs: 0.0,
            },
            directive: Some(Directive::Stare(believed)),
            effects: vec![
                TaskEffect::ReleaseWeapon { target },
                TaskEffect::SetFocusedScan { target, on: true },
            ],
        },
    }
}

fn evaluate_bda(ctx: &TaskContext, target: TargetId, stare_secs: f64) -> TaskUpdate {
    let elapsed = stare_secs + ctx.dt;
    if elapsed >= BDA_STARE_SECS || ctx.registry.get(target).is_none() {
        let mut update = revert_to_search();
        update
            .effects
            .push(TaskEffect::SetFocusedScan { target, on: false });
        update.effects.push(TaskEffect::BdaComplete { target });
        return update;
    }

    let stare_at = ctx
        .registry
        .get(target)
        .map(|t| t.position)
        .unwrap_or(ctx.position);
    TaskUpdate {
        task: AgentTask::Bda {
            target,
            stare_secs: elapsed,
        },
        directive: Some(Directive::Stare(stare_at)),
        effects: Vec::new(),
    }
}
