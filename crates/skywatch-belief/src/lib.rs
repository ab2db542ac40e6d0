//! Probabilistic world beliefs for SKYWATCH agents.
//!
//! Each agent owns one `GridBelief` (per-cell, per-type existence and
//! heading estimates) and one `TargetRegistry` (tracked targets with their
//! shared task status records). `merge` reconciles a received snapshot
//! into the local belief.

pub mod grid;
pub mod merge;
pub mod registry;
pub mod snapshot;

pub use grid::GridBelief;
pub use registry::{TargetBelief, TargetRegistry, TaskStatus};
pub use snapshot::BeliefSnapshot;
