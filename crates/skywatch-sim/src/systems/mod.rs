//! Engine systems, run in a fixed order each tick.

pub mod movement;
pub mod perception;
pub mod snapshot;
