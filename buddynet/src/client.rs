//! Client state machine: shared buddy/observer bookkeeping plus a tagged
//! protocol arm.
//!
//! A client monitors its *buddies* (outgoing edges) and is monitored by its
//! *observers* (incoming edges). The simulator owns every client and threads
//! the message queue, the stats sink, and the RNG through each call; clients
//! hold no references back into the simulator.

use crate::stats::SimStats;
use crate::time::{Duration, Timestamp};
use crate::traits::Random;
use crate::types::{
    ClientId, ClientList, ClientSet, ClientState, ClientStateMap, Message, MessageQueue,
};

pub use crate::gossip::GossipState;
pub use crate::heartbeat::HeartbeatState;

/// Protocol-specific client state.
#[derive(Debug, Clone)]
pub enum Protocol {
    Gossip(GossipState),
    Heartbeat(HeartbeatState),
}

/// One simulated client.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) id: ClientId,
    pub(crate) state: ClientState,
    sleep_period: Duration,

    /// Buddies in the order they were wired, with a set for membership.
    pub(crate) buddies: ClientList,
    buddies_set: ClientSet,

    /// Clients that monitor this one, in wiring order.
    pub(crate) observers: ClientList,
    observers_set: ClientSet,

    /// This client's belief about each buddy's state.
    pub(crate) buddy_state: ClientStateMap,

    pub(crate) protocol: Protocol,
}

impl Client {
    /// Create a client with no buddies or observers wired yet.
    pub fn new(
        id: ClientId,
        sleep_period: Duration,
        initial_state: ClientState,
        protocol: Protocol,
    ) -> Self {
        Self {
            id,
            state: initial_state,
            sleep_period,
            buddies: ClientList::new(),
            buddies_set: ClientSet::new(),
            observers: ClientList::new(),
            observers_set: ClientSet::new(),
            buddy_state: ClientStateMap::new(),
            protocol,
        }
    }

    /// Register `buddy` as monitored by this client, seeding the believed
    /// state. Returns false for self-edges and duplicates.
    pub fn add_buddy(&mut self, buddy: ClientId, buddy_state: ClientState) -> bool {
        if buddy == self.id || self.buddies_set.contains(&buddy) {
            return false;
        }

        self.buddies.push(buddy);
        self.buddies_set.insert(buddy);
        self.buddy_state.insert(buddy, buddy_state);
        true
    }

    /// Register `observer` as monitoring this client.
    /// Returns false for self-edges and duplicates.
    pub fn add_observer(&mut self, observer: ClientId) -> bool {
        if observer == self.id || self.observers_set.contains(&observer) {
            return false;
        }

        self.observers.push(observer);
        self.observers_set.insert(observer);
        true
    }

    /// Flip the client's state and return the new one.
    ///
    /// Protocol memory (gossip cycle counters, heartbeat cursors) is left
    /// untouched; a client waking up resumes where it left off.
    pub fn switch_state(&mut self) -> ClientState {
        self.state = self.state.toggled();
        self.state
    }

    /// Compare every buddy belief against ground truth, streaming the
    /// record counters into the stats sink.
    pub fn verify_state(&self, truth: &ClientStateMap, stats: &mut SimStats) {
        for (buddy, believed) in &self.buddy_state {
            stats.increment_buddy_records();
            if truth.get(buddy) == Some(believed) {
                stats.increment_correct_buddy_records();
            }
        }
    }

    /// Deliver one message. Offline clients are inert and return before any
    /// state mutation.
    pub fn handle_message<R: Random>(
        &mut self,
        message: &Message,
        queue: &mut MessageQueue,
        stats: &mut SimStats,
        rng: &mut R,
    ) {
        if !self.is_online() {
            return;
        }

        match self.protocol {
            Protocol::Gossip(_) => self.handle_gossip_message(message, queue, stats, rng),
            Protocol::Heartbeat(_) => self.handle_heartbeat_message(message, stats),
        }
    }

    /// Run the protocol's periodic work for this tick. Offline clients are
    /// inert.
    pub fn run_tasks<R: Random>(
        &mut self,
        now: Timestamp,
        queue: &mut MessageQueue,
        stats: &mut SimStats,
        rng: &mut R,
    ) {
        if !self.is_online() {
            return;
        }

        match self.protocol {
            Protocol::Gossip(_) => self.run_gossip_tasks(now, queue, rng),
            Protocol::Heartbeat(_) => self.run_heartbeat_tasks(now, queue, stats),
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn is_online(&self) -> bool {
        self.state == ClientState::Online
    }

    pub fn sleep_period(&self) -> Duration {
        self.sleep_period
    }

    pub fn buddy_count(&self) -> usize {
        self.buddies_set.len()
    }

    pub fn buddies(&self) -> &[ClientId] {
        &self.buddies
    }

    pub fn observers(&self) -> &[ClientId] {
        &self.observers
    }

    /// Whether `id` is one of this client's buddies.
    pub fn has_buddy(&self, id: ClientId) -> bool {
        self.buddies_set.contains(&id)
    }

    /// Whether `id` observes this client.
    pub fn has_observer(&self, id: ClientId) -> bool {
        self.observers_set.contains(&id)
    }

    /// Current believed state of a buddy.
    pub fn believed_state(&self, buddy: ClientId) -> Option<ClientState> {
        self.buddy_state.get(&buddy).copied()
    }

    /// The gossip arm, if this is a gossip client.
    pub fn gossip(&self) -> Option<&GossipState> {
        match &self.protocol {
            Protocol::Gossip(g) => Some(g),
            Protocol::Heartbeat(_) => None,
        }
    }

    /// The heartbeat arm, if this is a heartbeat client.
    pub fn heartbeat(&self) -> Option<&HeartbeatState> {
        match &self.protocol {
            Protocol::Heartbeat(h) => Some(h),
            Protocol::Gossip(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClientState::{Offline, Online};

    fn gossip_client(id: ClientId) -> Client {
        Client::new(
            id,
            Duration::from_secs(100),
            Online,
            Protocol::Gossip(GossipState::default()),
        )
    }

    #[test]
    fn test_add_buddy_rejects_self_and_duplicates() {
        let mut client = gossip_client(0);

        assert!(!client.add_buddy(0, Online));
        assert!(client.add_buddy(1, Offline));
        assert!(!client.add_buddy(1, Online));

        assert_eq!(client.buddy_count(), 1);
        assert_eq!(client.believed_state(1), Some(Offline));
    }

    #[test]
    fn test_add_observer_rejects_self_and_duplicates() {
        let mut client = gossip_client(2);

        assert!(!client.add_observer(2));
        assert!(client.add_observer(5));
        assert!(!client.add_observer(5));

        assert_eq!(client.observers(), &[5]);
        assert!(client.has_observer(5));
    }

    #[test]
    fn test_switch_state_round_trips() {
        let mut client = gossip_client(0);
        assert!(client.is_online());

        assert_eq!(client.switch_state(), Offline);
        assert_eq!(client.switch_state(), Online);
        assert!(client.is_online());
    }

    #[test]
    fn test_verify_state_counts_records() {
        let mut client = gossip_client(0);
        client.add_buddy(1, Online);
        client.add_buddy(2, Online);

        let mut truth = ClientStateMap::new();
        truth.insert(1, Online);
        truth.insert(2, Offline);

        let mut stats = SimStats::new();
        client.verify_state(&truth, &mut stats);

        assert_eq!(stats.total_buddy_records, 2);
        assert_eq!(stats.total_correct_buddy_records, 1);

        // Re-verification doubles the counters and keeps the ratio.
        client.verify_state(&truth, &mut stats);
        assert_eq!(stats.total_buddy_records, 4);
        assert_eq!(stats.total_correct_buddy_records, 2);
        assert!((stats.accuracy() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_offline_client_is_inert() {
        use crate::traits::test_impls::MockRandom;
        use crate::types::{Message, MessageType};

        let mut client = gossip_client(0);
        client.add_buddy(1, Offline);
        client.add_observer(1);
        client.switch_state();
        assert!(!client.is_online());

        let mut queue = MessageQueue::new();
        let mut stats = SimStats::new();
        let mut rng = MockRandom::new();

        let mut chain = ClientSet::new();
        chain.insert(1);
        let msg = Message::new(
            0,
            1,
            Timestamp::from_secs(60),
            Timestamp::from_secs(60),
            MessageType::Gossip,
            chain,
        );

        client.handle_message(&msg, &mut queue, &mut stats, &mut rng);
        client.run_tasks(Timestamp::from_secs(60), &mut queue, &mut stats, &mut rng);

        assert!(queue.is_empty());
        assert_eq!(stats.presence_updates, 0);
        assert_eq!(client.believed_state(1), Some(Offline));
    }
}
