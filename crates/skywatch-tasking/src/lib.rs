//! Decentralized tasking for SKYWATCH agents.
//!
//! Holds the agent capability model, the task auction each agent runs once
//! per tick against its own view of task ownership, and the task execution
//! state machines that turn an awarded task into routing/staring
//! directives. No ECS dependency — operates on plain data.

pub mod auction;
pub mod capabilities;
pub mod fsm;

pub use auction::{run_auction, AuctionContext, AuctionOutcome};
pub use capabilities::{AgentCapabilities, EffectivenessTable, SensorFit, WeaponStation};
pub use fsm::{evaluate, AgentTask, Directive, TaskContext, TaskEffect, TaskUpdate};

#[cfg(test)]
mod tests;
