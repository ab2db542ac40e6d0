//! Decentralized task auction.
//!
//! Each agent runs the auction once per tick against its own registry —
//! its cached view of task ownership. Ownership changes happen only
//! through `TaskStatus::submit_bid`, so "highest score wins, ties keep the
//! incumbent" holds per (target, task kind) regardless of how stale the
//! local view is; merges reconcile divergent views afterwards.

use tracing::debug;

use skywatch_belief::registry::{TargetBelief, TargetRegistry};
use skywatch_core::enums::{TaskKind, TaskState};
use skywatch_core::types::{AgentId, Coordinate, TargetId};
use skywatch_sensing::DetectionTables;

use crate::capabilities::{AgentCapabilities, EffectivenessTable};

/// Per-agent inputs to one auction round.
pub struct AuctionContext<'a> {
    pub agent: AgentId,
    pub position: Coordinate,
    /// Simulation time of this round (stamped onto ownership writes).
    pub now: f64,
    /// World diagonal, the bid normalization distance.
    pub max_world_distance: f64,
    pub capabilities: &'a AgentCapabilities,
    pub detection: &'a DetectionTables,
    pub effectiveness: &'a EffectivenessTable,
}

/// What the auction decided for this agent this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuctionOutcome {
    /// Still owns its current task; re-bid recorded in place.
    Holding { kind: TaskKind, target: TargetId },
    /// Won a new task.
    Claimed {
        kind: TaskKind,
        target: TargetId,
        score: f64,
    },
    /// Held Attack, found the owner cleared: the target was successfully
    /// attacked by someone. Revert to Search.
    AttackResolvedExternally { target: TargetId },
    /// Held a task, found another owner recorded: out-bid. Revert to
    /// Search.
    Outbid { kind: TaskKind, target: TargetId },
    /// Nothing to hold and no improving bid.
    Search,
}

/// Monitor suitability bid, or `None` when the agent has no sensor
/// capable of the target's most likely type.
pub fn monitor_bid(ctx: &AuctionContext, target: &TargetBelief) -> Option<f64> {
    let p = ctx
        .capabilities
        .best_sensor_prob(ctx.detection, target.most_likely_type())?;
    let distance = ctx.position.distance_to(&target.position);
    Some(ctx.max_world_distance - distance + ctx.max_world_distance * p)
}

/// Attack suitability bid, or `None` when the agent has no armed weapon
/// effective against the target's most likely type.
pub fn attack_bid(ctx: &AuctionContext, target: &TargetBelief) -> Option<f64> {
    let (_, p) = ctx
        .capabilities
        .best_weapon(ctx.effectiveness, target.most_likely_type())?;
    let distance = ctx.position.distance_to(&target.position);
    Some(ctx.max_world_distance - distance + ctx.max_world_distance * p)
}

/// Run one auction round. `holding` is the task the agent's local state
/// machine currently serves, if any.
pub fn run_auction(
    ctx: &AuctionContext,
    registry: &mut TargetRegistry,
    holding: Option<(TaskKind, TargetId)>,
) -> AuctionOutcome {
    if let Some((kind, target_id)) = holding {
        return rebid_held_task(ctx, registry, kind, target_id);
    }
    bid_while_idle(ctx, registry)
}

/// Re-bid path: the agent owns (or believes it owns) a task.
fn rebid_held_task(
    ctx: &AuctionContext,
    registry: &mut TargetRegistry,
    kind: TaskKind,
    target_id: TargetId,
) -> AuctionOutcome {
    let Some(target) = registry.get_mut(target_id) else {
        return AuctionOutcome::Search;
    };
    if target.destroyed {
        return AuctionOutcome::Search;
    }

    let bid = match kind {
        TaskKind::Monitor => monitor_bid(ctx, target),
        TaskKind::Attack => attack_bid(ctx, target),
    };

    let status = match kind {
        TaskKind::Monitor => &mut target.monitor,
        TaskKind::Attack => &mut target.attack,
    };

    match status.owner {
        Some(owner) if owner == ctx.agent => {
            let Some(bid) = bid else {
                // Capability gone (e.g. last round expended): stand down
                // so someone else can claim.
                status.release(ctx.now);
                return AuctionOutcome::Search;
            };
            // An agent never loses its own re-bid to itself.
            status.submit_bid(ctx.agent, bid, ctx.now);
            AuctionOutcome::Holding {
                kind,
                target: target_id,
            }
        }
        None => match kind {
            // Cleared attack ownership means the target was successfully
            // attacked; a laggard owner converges instead of re-claiming.
            TaskKind::Attack => AuctionOutcome::AttackResolvedExternally { target: target_id },
            // A completed monitor task ended naturally; anything else was
            // released out from under us.
            TaskKind::Monitor if status.state.is_complete() => AuctionOutcome::Search,
            TaskKind::Monitor => AuctionOutcome::Outbid {
                kind,
                target: target_id,
            },
        },
        Some(other) => {
            debug!(agent = ctx.agent.0, owner = other.0, target = target_id.0, ?kind, "out-bid");
            AuctionOutcome::Outbid {
                kind,
                target: target_id,
            }
        }
    }
}

/// Idle path: score every live target and claim the single best improving
/// bid, Attack taking precedence over Monitor.
fn bid_while_idle(ctx: &AuctionContext, registry: &mut TargetRegistry) -> AuctionOutcome {
    let mut best_monitor: Option<(TargetId, f64)> = None;
    let mut best_attack: Option<(TargetId, f64)> = None;

    for target in registry.live() {
        if let Some(bid) = monitor_bid(ctx, target) {
            // Improving means strictly above the recorded owner score.
            if bid > target.monitor.score && !target.monitor.state.is_complete() {
                if best_monitor.is_none_or(|(_, b)| bid > b) {
                    best_monitor = Some((target.id, bid));
                }
            }
        }
        // Attack is only biddable once opened by a confirm, and never
        // after it has begun performing.
        if matches!(target.attack.state, TaskState::Open | TaskState::EnRoute) {
            if let Some(bid) = attack_bid(ctx, target) {
                if bid > target.attack.score && best_attack.is_none_or(|(_, b)| bid > b) {
                    best_attack = Some((target.id, bid));
                }
            }
        }
    }

    // Precedence: an improving Attack bid suppresses any Monitor bid.
    if let Some((target_id, bid)) = best_attack {
        return claim(ctx, registry, TaskKind::Attack, target_id, bid);
    }
    if let Some((target_id, bid)) = best_monitor {
        return claim(ctx, registry, TaskKind::Monitor, target_id, bid);
    }
    AuctionOutcome::Search
}

fn claim(
    ctx: &AuctionContext,
    registry: &mut TargetRegistry,
    kind: TaskKind,
    target_id: TargetId,
    bid: f64,
) -> AuctionOutcome {
    let Some(target) = registry.get_mut(target_id) else {
        return AuctionOutcome::Search;
    };
    let status = match kind {
        TaskKind::Monitor => &mut target.monitor,
        TaskKind::Attack => &mut target.attack,
    };
    // First bid on a fresh monitor task opens it.
    status.ensure_open(ctx.now);
    if !status.submit_bid(ctx.agent, bid, ctx.now) {
        return AuctionOutcome::Search;
    }
    debug!(agent = ctx.agent.0, target = target_id.0, ?kind, bid, "claimed task");
    AuctionOutcome::Claimed {
        kind,
        target: target_id,
        score: bid,
    }
}
