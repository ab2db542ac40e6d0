//! Multi-agent swarm engine for SKYWATCH.
//!
//! Owns the hecs ground-truth world and the decentralized agents, steps
//! them at a fixed tick rate, and produces `SwarmSnapshot`s. Completely
//! headless, enabling deterministic testing.

pub mod agent;
pub mod engine;
pub mod pathing;
pub mod systems;
pub mod transport;
pub mod truth;
pub mod world_setup;

pub use engine::{SwarmConfig, SwarmEngine};
