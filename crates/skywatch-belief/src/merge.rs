//! Belief merge: fold a snapshot received from another agent into the
//! local belief.
//!
//! Per-field conflicts resolve by latest timestamp; a timestamp tie falls
//! back to higher existence probability. Processing the same snapshot
//! twice, or snapshots from different senders in either order, never
//! corrupts the local belief.

use crate::grid::GridBelief;
use crate::registry::{TargetBelief, TargetRegistry, TaskStatus};
use crate::snapshot::BeliefSnapshot;

/// Merge a received snapshot into the local grid and registry.
pub fn merge_snapshot(grid: &mut GridBelief, registry: &mut TargetRegistry, snap: &BeliefSnapshot) {
    grid.merge_from(&snap.grid);
    merge_targets(registry, &snap.targets);
}

/// Merge remote target records into the local registry.
pub fn merge_targets(registry: &mut TargetRegistry, remote: &[TargetBelief]) {
    for theirs in remote {
        match registry.get_mut(theirs.id) {
            None => registry.insert(theirs.clone()),
            Some(ours) => merge_target(ours, theirs),
        }
    }
}

fn merge_target(ours: &mut TargetBelief, theirs: &TargetBelief) {
    // Location/type estimate: newest refresh wins.
    let take_estimate = theirs.updated > ours.updated
        || (theirs.updated == ours.updated && newer_by_prob(theirs, ours));
    if take_estimate {
        ours.position = theirs.position;
        ours.heading_deg = theirs.heading_deg;
        ours.type_probs.clear();
        ours.type_probs.extend_from_slice(&theirs.type_probs);
        ours.focused_scan = theirs.focused_scan;
        ours.updated = theirs.updated;
    }

    merge_task(&mut ours.monitor, &theirs.monitor);
    merge_task(&mut ours.attack, &theirs.attack);

    // Terminal flag is sticky in both directions.
    ours.destroyed |= theirs.destroyed;
}

fn newer_by_prob(a: &TargetBelief, b: &TargetBelief) -> bool {
    let pa = a.type_probs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let pb = b.type_probs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    pa > pb
}

/// One task record: the whole record travels together, latest write wins,
/// score breaks a timestamp tie.
fn merge_task(ours: &mut TaskStatus, theirs: &TaskStatus) {
    let take = theirs.updated > ours.updated
        || (theirs.updated == ours.updated && theirs.score > ours.score);
    if take {
        *ours = theirs.clone();
    }
}
