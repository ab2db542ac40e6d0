//! In-process transport collaborator: per-agent inbound queues with
//! broadcast fan-out. Real radio/network transport lives outside this
//! repository; the engine only consumes `broadcast` and `drain_inbound`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use skywatch_belief::BeliefSnapshot;
use skywatch_core::types::{AgentId, Coordinate};

/// Messages exchanged between agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SwarmMessage {
    /// A serialized belief snapshot tagged with its originating agent.
    BeliefShare { snapshot: BeliefSnapshot },
    /// Position/heading telemetry. The belief layer does not consume this
    /// variant; receivers without a handler log and drop it.
    Telemetry {
        agent_id: AgentId,
        position: Coordinate,
        heading_deg: f64,
    },
}

/// Broadcast message bus with one inbound queue per agent. Delivery order
/// is per-sender FIFO; no ordering guarantee across senders.
#[derive(Debug, Clone, Default)]
pub struct MessageBus {
    inboxes: Vec<VecDeque<SwarmMessage>>,
    messages_sent: u64,
}

impl MessageBus {
    pub fn new(agent_count: usize) -> Self {
        Self {
            inboxes: (0..agent_count).map(|_| VecDeque::new()).collect(),
            messages_sent: 0,
        }
    }

    /// Queue a message into every inbox except the sender's.
    pub fn broadcast(&mut self, from: AgentId, message: SwarmMessage) {
        for (idx, inbox) in self.inboxes.iter_mut().enumerate() {
            if idx as u32 == from.0 {
                continue;
            }
            inbox.push_back(message.clone());
            self.messages_sent += 1;
        }
    }

    /// Drain one agent's inbound queue in delivery order.
    pub fn drain_inbound(&mut self, agent: AgentId) -> Vec<SwarmMessage> {
        match self.inboxes.get_mut(agent.0 as usize) {
            Some(inbox) => inbox.drain(..).collect(),
            None => Vec::new(),
        }
    }

    /// Total messages delivered to inboxes since construction.
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent
    }
}
