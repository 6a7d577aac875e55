//! Flooded gossip protocol.
//!
//! Every gossip interval each online client originates a cycle: it seeds two
//! messages carrying its own id in the client chain and a `gossip_id` equal
//! to the origination timestamp. Receivers absorb the chain, infer that
//! their buddies are reachable, append themselves, and forward to one random
//! observer until the per-cycle budget runs out.
//!
//! Liveness inference is deliberately coarse: the start of a new cycle
//! pessimistically resets every buddy belief to offline, and any gossip
//! arriving afterwards promotes every buddy back to online. Convergence
//! deltas are measured against the forwarding sender's last switch, the
//! freshest proxy a receiver has for how old the information is.

use crate::client::{Client, Protocol};
use crate::stats::SimStats;
use crate::time::Timestamp;
use crate::traits::Random;
use crate::types::{
    ClientSet, ClientState, Message, MessageQueue, MessageType, GOSSIP_FORWARD_BUDGET,
    GOSSIP_SEED_BUDGET,
};

/// Gossip arm of a client.
#[derive(Debug, Clone, Default)]
pub struct GossipState {
    /// The `gossip_id` of the cycle this client last participated in.
    pub(crate) last_gossip_request: Timestamp,
    /// Messages emitted in the current cycle, seeds included.
    pub(crate) messages_sent: u32,
    /// Union of every client chain observed this cycle.
    pub(crate) gossiped_nodes: ClientSet,
}

impl GossipState {
    /// Ids known to have carried the current cycle.
    pub fn gossiped_nodes(&self) -> &ClientSet {
        &self.gossiped_nodes
    }

    /// Messages emitted in the current cycle.
    pub fn messages_sent(&self) -> u32 {
        self.messages_sent
    }

    /// The cycle id last observed.
    pub fn last_gossip_request(&self) -> Timestamp {
        self.last_gossip_request
    }
}

impl Client {
    /// Process one incoming gossip message: cycle bookkeeping, liveness
    /// inference, and a single random forward.
    pub(crate) fn handle_gossip_message<R: Random>(
        &mut self,
        message: &Message,
        queue: &mut MessageQueue,
        stats: &mut SimStats,
        rng: &mut R,
    ) {
        let Protocol::Gossip(gossip) = &mut self.protocol else {
            return;
        };

        // A changed gossip_id starts a new cycle: forget the previous one
        // and assume every buddy went offline until the chain says otherwise.
        if gossip.last_gossip_request != message.gossip_id {
            gossip.gossiped_nodes.clear();
            gossip.messages_sent = 0;
            gossip.last_gossip_request = message.gossip_id;

            for (&buddy, believed) in self.buddy_state.iter_mut() {
                *believed = ClientState::Offline;

                if stats.last_state(buddy) == ClientState::Offline {
                    stats.increment_presence_updates();
                    let delta = message.timestamp - stats.last_state_switch(message.sender);
                    stats.add_convergence_time(delta);
                }
            }
        }

        if gossip.messages_sent >= GOSSIP_FORWARD_BUDGET {
            return;
        }

        if self.observers.is_empty() {
            return;
        }

        // Pick the forwarding target before touching beliefs, so the draw
        // order stays stable. Observers never contain ourselves, but keep
        // the re-draw guard anyway.
        let mut target = rng.gen_index(self.observers.len());
        while self.observers[target] == self.id {
            target = rng.gen_index(self.observers.len());
        }

        // Everyone on the chain has demonstrably forwarded this cycle.
        gossip
            .gossiped_nodes
            .extend(message.client_chain.iter().copied());

        // Any gossip reaching us is evidence the neighbourhood is awake:
        // promote every buddy, crediting the flips that match ground truth.
        for (&buddy, believed) in self.buddy_state.iter_mut() {
            if *believed != ClientState::Online && stats.last_state(buddy) == ClientState::Online {
                stats.increment_presence_updates();
                let delta = message.timestamp - stats.last_state_switch(message.sender);
                stats.add_convergence_time(delta);
            }
            *believed = ClientState::Online;
        }

        let mut chain = message.client_chain.clone();
        chain.insert(self.id);

        queue.push_back(Message::new(
            self.observers[target],
            self.id,
            message.timestamp,
            message.gossip_id,
            MessageType::Gossip,
            chain,
        ));
        gossip.messages_sent += 1;
    }

    /// Originate a gossip cycle: pre-charge the seed budget and send the
    /// initial chain to two distinct random observers.
    pub(crate) fn run_gossip_tasks<R: Random>(
        &mut self,
        now: Timestamp,
        queue: &mut MessageQueue,
        rng: &mut R,
    ) {
        let Protocol::Gossip(gossip) = &mut self.protocol else {
            return;
        };

        gossip.messages_sent = GOSSIP_SEED_BUDGET;
        gossip.gossiped_nodes.clear();

        if self.observers.is_empty() {
            return;
        }

        let mut first = rng.gen_index(self.observers.len());
        while self.observers[first] == self.id {
            first = rng.gen_index(self.observers.len());
        }

        gossip.last_gossip_request = now;

        let mut chain = ClientSet::new();
        chain.insert(self.id);

        queue.push_back(Message::new(
            self.observers[first],
            self.id,
            now,
            now,
            MessageType::Gossip,
            chain.clone(),
        ));

        // With a single observer there is no distinct second target; the
        // seed budget stays charged either way.
        if self.observers.len() > 1 {
            let mut second = rng.gen_index(self.observers.len());
            while self.observers[second] == self.id || second == first {
                second = rng.gen_index(self.observers.len());
            }

            queue.push_back(Message::new(
                self.observers[second],
                self.id,
                now,
                now,
                MessageType::Gossip,
                chain,
            ));
        }
    }
}
