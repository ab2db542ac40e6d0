//! Ground-truth world: real targets as hecs entities, plus the query view
//! the scan engine consumes.

use hecs::World;

use skywatch_core::types::{Coordinate, GridCell, GridFrame, TargetId, TargetType};
use skywatch_sensing::{GroundTruth, TruthObservation};

/// A real target in the world. Agents never read this directly; it feeds
/// the truth-query collaborator and the viewer snapshot.
#[derive(Debug, Clone, Copy)]
pub struct TruthTarget {
    pub id: TargetId,
    pub ttype: TargetType,
    pub destroyed: bool,
}

/// Velocity of a mobile truth target (m/s). Static targets carry zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct TruthVelocity {
    pub x: f64,
    pub y: f64,
}

impl TruthVelocity {
    /// Heading in degrees (0 = North, clockwise).
    pub fn heading_deg(&self) -> f64 {
        self.x.atan2(self.y).to_degrees().rem_euclid(360.0)
    }
}

/// Read-only truth query view over the hecs world.
pub struct TruthView<'a> {
    pub world: &'a World,
    pub frame: GridFrame,
}

impl GroundTruth for TruthView<'_> {
    fn target_in_cell(&self, cell: GridCell, ttype: TargetType) -> Option<TruthObservation> {
        let mut found: Option<TruthObservation> = None;
        let mut query = self
            .world
            .query::<(&TruthTarget, &Coordinate, &TruthVelocity)>();
        for (_entity, (target, pos, vel)) in query.iter() {
            if target.destroyed || target.ttype != ttype {
                continue;
            }
            if self.frame.cell_of(pos) != Some(cell) {
                continue;
            }
            let obs = TruthObservation {
                id: target.id,
                ttype: target.ttype,
                position: *pos,
                heading_deg: vel.heading_deg(),
            };
            // Lowest ID wins so co-located targets resolve deterministically.
            if found.is_none_or(|f| obs.id < f.id) {
                found = Some(obs);
            }
        }
        found
    }

    fn targets_in_region(&self, min: Coordinate, max: Coordinate) -> Vec<TruthObservation> {
        let mut out = Vec::new();
        let mut query = self
            .world
            .query::<(&TruthTarget, &Coordinate, &TruthVelocity)>();
        for (_entity, (target, pos, vel)) in query.iter() {
            if target.destroyed {
                continue;
            }
            if pos.x < min.x || pos.x > max.x || pos.y < min.y || pos.y > max.y {
                continue;
            }
            out.push(TruthObservation {
                id: target.id,
                ttype: target.ttype,
                position: *pos,
                heading_deg: vel.heading_deg(),
            });
        }
        out.sort_by_key(|obs| obs.id);
        out
    }
}

/// Mark a truth target destroyed and stop it.
pub fn mark_destroyed(world: &mut World, target_id: TargetId) {
    for (_entity, (target, vel)) in world.query_mut::<(&mut TruthTarget, &mut TruthVelocity)>() {
        if target.id == target_id {
            target.destroyed = true;
            *vel = TruthVelocity::default();
        }
    }
}
