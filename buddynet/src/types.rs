//! Core types and constants for the presence protocols.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};

use crate::time::{Duration, Timestamp};

// Gossip limits
/// Maximum messages a client may forward within a single gossip cycle.
pub const GOSSIP_FORWARD_BUDGET: u32 = 5;
/// Forward budget consumed up front when a client originates a cycle.
pub const GOSSIP_SEED_BUDGET: u32 = 2;

// Heartbeat timing
/// A heartbeat is emitted once the previous one is more than this old,
/// giving one ping every 12 simulated seconds.
pub const HEARTBEAT_GAP: Duration = Duration::from_secs(11);
/// Nominal spacing between heartbeats from one client.
pub const HEARTBEAT_PERIOD: Duration = Duration::from_secs(12);
/// A buddy is demoted after missing this many full round-robin sweeps.
pub const STALENESS_SWEEPS: u64 = 3;

/// Client identifier, dense in `[0, node_count)`.
pub type ClientId = u32;

/// Ordered list of client ids.
pub type ClientList = Vec<ClientId>;

/// Unordered set of client ids.
pub type ClientSet = HashSet<ClientId>;

/// Per-buddy belief (or ground truth) about client states.
pub type ClientStateMap = HashMap<ClientId, ClientState>;

/// FIFO queue of in-flight messages, owned by the simulator.
pub type MessageQueue = VecDeque<Message>;

/// Whether a client is currently reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientState {
    Online,
    Offline,
}

impl ClientState {
    /// The opposite state.
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            ClientState::Online => ClientState::Offline,
            ClientState::Offline => ClientState::Online,
        }
    }
}

/// Wire-level message kind.
///
/// `Discovery` is reserved for a future neighbour-discovery exchange and is
/// never constructed by the current protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Heartbeat,
    Discovery,
    Gossip,
}

/// A single in-flight protocol message.
///
/// `gossip_id` is the originating client's timestamp for gossip messages and
/// `Timestamp::ZERO` for heartbeats. `client_chain` carries the set of ids
/// that have forwarded the current gossip cycle; it is empty for heartbeats.
#[derive(Debug, Clone)]
pub struct Message {
    pub recipient: ClientId,
    pub sender: ClientId,
    pub timestamp: Timestamp,
    pub gossip_id: Timestamp,
    pub message_type: MessageType,
    pub client_chain: ClientSet,
}

impl Message {
    pub fn new(
        recipient: ClientId,
        sender: ClientId,
        timestamp: Timestamp,
        gossip_id: Timestamp,
        message_type: MessageType,
        client_chain: ClientSet,
    ) -> Self {
        Self {
            recipient,
            sender,
            timestamp,
            gossip_id,
            message_type,
            client_chain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_toggle() {
        assert_eq!(ClientState::Online.toggled(), ClientState::Offline);
        assert_eq!(ClientState::Offline.toggled(), ClientState::Online);
    }

    #[test]
    fn test_message_construction() {
        let mut chain = ClientSet::new();
        chain.insert(7);

        let msg = Message::new(
            3,
            7,
            Timestamp::from_secs(60),
            Timestamp::from_secs(60),
            MessageType::Gossip,
            chain,
        );

        assert_eq!(msg.recipient, 3);
        assert_eq!(msg.sender, 7);
        assert_eq!(msg.message_type, MessageType::Gossip);
        assert!(msg.client_chain.contains(&7));
    }

    #[test]
    fn test_heartbeat_spacing_constants() {
        // The emission gate is "strictly more than the gap", which spaces
        // heartbeats one nominal period apart.
        assert_eq!(HEARTBEAT_GAP + Duration::from_secs(1), HEARTBEAT_PERIOD);
    }
}
