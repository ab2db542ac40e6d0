//! Target Belief Registry: tracked targets and their shared task status.
//!
//! Registry entries are created the first time a target is tracked and
//! persist for the simulation's duration. Destroyed targets stay in the
//! registry with `destroyed = true` so laggard agents converge on
//! "complete" instead of re-bidding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use skywatch_core::enums::TaskState;
use skywatch_core::types::{AgentId, Coordinate, GridCell, TargetId, TargetType};

/// Shared ownership record for one task kind on one target.
///
/// Ownership is a single scalar field: at most one agent is ever recorded
/// as owner. All bid traffic goes through [`TaskStatus::submit_bid`], which
/// expresses the read-compare-write as one call. Within a sequential
/// scheduler that is sufficient; if agents are ever stepped concurrently,
/// the caller must serialize calls per (target, task kind) — one writer, or
/// a per-entry lock around the call — or "exactly one owner" breaks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    pub owner: Option<AgentId>,
    /// The recorded owner's bid value.
    pub score: f64,
    /// Timestamp of the last ownership/score write.
    pub updated: f64,
}

impl TaskStatus {
    /// Lazily open a task that has never been bid on.
    pub fn ensure_open(&mut self, now: f64) {
        if self.state == TaskState::NoTask {
            self.state = TaskState::Open;
            self.updated = now;
        }
    }

    /// Submit a bid. The incumbent always succeeds at refreshing its own
    /// score and timestamp in place; a challenger succeeds only with a
    /// strictly higher score (ties keep the incumbent). A successful
    /// takeover puts the task EnRoute for the new owner.
    pub fn submit_bid(&mut self, agent: AgentId, score: f64, now: f64) -> bool {
        if self.state.is_complete() {
            return false;
        }
        if self.owner == Some(agent) {
            self.score = score;
            self.updated = now;
            return true;
        }
        if score > self.score {
            self.owner = Some(agent);
            self.score = score;
            self.updated = now;
            self.state = TaskState::EnRoute;
            debug_assert_eq!(self.owner, Some(agent));
            return true;
        }
        false
    }

    /// Clear ownership and return the task to Open. Used when an owner
    /// abandons a task or the engine resets a missed attack.
    pub fn release(&mut self, now: f64) {
        self.owner = None;
        self.score = 0.0;
        self.updated = now;
        if !self.state.is_complete() {
            self.state = TaskState::Open;
        }
    }

    /// The owner has arrived on station.
    pub fn mark_performing(&mut self, now: f64) {
        self.state = TaskState::Performing;
        self.updated = now;
    }

    /// Terminal: the task finished. Ownership is cleared so any lagging
    /// owner infers completion rather than re-claiming.
    pub fn complete(&mut self, now: f64) {
        self.state = TaskState::Complete;
        self.owner = None;
        self.score = 0.0;
        self.updated = now;
    }
}

/// One tracked target: location/heading estimate, type distribution, and
/// the shared Monitor/Attack task records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetBelief {
    pub id: TargetId,
    pub position: Coordinate,
    /// Estimated heading, degrees (0 = North, clockwise).
    pub heading_deg: f64,
    /// Per-type probability vector for "most likely type" queries.
    pub type_probs: Vec<f64>,
    /// Timestamp of the last location/type refresh.
    pub updated: f64,
    pub monitor: TaskStatus,
    pub attack: TaskStatus,
    /// Terminal and sticky: set once an attack kills the target.
    pub destroyed: bool,
    /// Set while some agent holds a focused confirm/BDA stare on this
    /// target.
    pub focused_scan: bool,
}

impl TargetBelief {
    pub fn new(
        id: TargetId,
        position: Coordinate,
        heading_deg: f64,
        type_probs: Vec<f64>,
        now: f64,
    ) -> Self {
        Self {
            id,
            position,
            heading_deg: heading_deg.rem_euclid(360.0),
            type_probs,
            updated: now,
            monitor: TaskStatus::default(),
            attack: TaskStatus::default(),
            destroyed: false,
            focused_scan: false,
        }
    }

    /// Most likely target type: argmax of the type distribution, lowest
    /// index winning ties.
    pub fn most_likely_type(&self) -> TargetType {
        let mut best = 0;
        let mut best_p = f64::NEG_INFINITY;
        for (i, &p) in self.type_probs.iter().enumerate() {
            if p > best_p {
                best_p = p;
                best = i;
            }
        }
        TargetType(best as u16)
    }

    /// Refresh the location/type estimate from a newer observation.
    pub fn refresh(
        &mut self,
        position: Coordinate,
        heading_deg: f64,
        type_probs: &[f64],
        now: f64,
    ) {
        self.position = position;
        self.heading_deg = heading_deg.rem_euclid(360.0);
        self.type_probs.clear();
        self.type_probs.extend_from_slice(type_probs);
        self.updated = now;
    }
}

/// All targets this agent has ever tracked, keyed by stable target ID.
/// BTreeMap keeps iteration (and thus auction evaluation and snapshot
/// serialization) deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetRegistry {
    targets: BTreeMap<TargetId, TargetBelief>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, id: TargetId) -> Option<&TargetBelief> {
        self.targets.get(&id)
    }

    pub fn get_mut(&mut self, id: TargetId) -> Option<&mut TargetBelief> {
        self.targets.get_mut(&id)
    }

    pub fn insert(&mut self, target: TargetBelief) {
        self.targets.insert(target.id, target);
    }

    /// Returns true if the observation created a new entry.
    pub fn observe(
        &mut self,
        id: TargetId,
        position: Coordinate,
        heading_deg: f64,
        type_probs: &[f64],
        now: f64,
    ) -> bool {
        match self.targets.get_mut(&id) {
            Some(existing) => {
                existing.refresh(position, heading_deg, type_probs, now);
                false
            }
            None => {
                self.targets.insert(
                    id,
                    TargetBelief::new(id, position, heading_deg, type_probs.to_vec(), now),
                );
                true
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetBelief> {
        self.targets.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TargetBelief> {
        self.targets.values_mut()
    }

    /// Targets still in play (not destroyed).
    pub fn live(&self) -> impl Iterator<Item = &TargetBelief> {
        self.targets.values().filter(|t| !t.destroyed)
    }

    pub fn live_mut(&mut self) -> impl Iterator<Item = &mut TargetBelief> {
        self.targets.values_mut().filter(|t| !t.destroyed)
    }
}

/// Maps a truth-side observation to the stable cross-agent target ID.
///
/// The shipped policy passes the truth ID straight through — cross-agent
/// identity is assumed pre-correlated. Real track-to-track association
/// would replace this implementation; the seam exists so that assumption
/// is a capability, not a hard fact.
pub trait CorrelationPolicy {
    fn correlate(&self, truth_id: TargetId, cell: GridCell, ttype: TargetType) -> TargetId;
}

/// Identity pass-through correlation.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCorrelation;

impl CorrelationPolicy for IdentityCorrelation {
    fn correlate(&self, truth_id: TargetId, _cell: GridCell, _ttype: TargetType) -> TargetId {
        truth_id
    }
}
