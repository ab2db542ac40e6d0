//! Core types and definitions for the SKYWATCH swarm simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometric types, identifiers, task enums, state snapshots, events, and
//! constants. It has no dependency on the simulation runtime.

pub mod constants;
pub mod enums;
pub mod events;
pub mod state;
pub mod types;
