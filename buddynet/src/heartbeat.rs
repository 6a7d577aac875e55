//! Round-robin heartbeat protocol.
//!
//! Each online client unicasts a liveness ping to one observer at a time,
//! rotating through its observer list roughly every 12 simulated seconds.
//! Receipt of a ping promotes the sender's believed state to online; a
//! buddy whose pings have been missing for several full round-robin sweeps
//! is demoted to offline.

use crate::client::{Client, Protocol};
use crate::stats::SimStats;
use crate::time::Timestamp;
use crate::types::{
    ClientId, ClientSet, ClientState, Message, MessageQueue, MessageType, HEARTBEAT_GAP,
    HEARTBEAT_PERIOD, STALENESS_SWEEPS,
};

use hashbrown::HashMap;

/// Heartbeat arm of a client.
#[derive(Debug, Clone, Default)]
pub struct HeartbeatState {
    /// Round-robin cursor into the observer list.
    pub(crate) next_observer: usize,
    /// When this client last emitted a ping.
    pub(crate) last_message_timestamp: Timestamp,
    /// Per-buddy timestamp of the most recent ping received from it.
    pub(crate) last_buddy_update: HashMap<ClientId, Timestamp>,
}

impl HeartbeatState {
    /// When the given buddy last pinged this client, if ever.
    pub fn last_buddy_update(&self, buddy: ClientId) -> Option<Timestamp> {
        self.last_buddy_update.get(&buddy).copied()
    }

    /// When this client last emitted a ping.
    pub fn last_message_timestamp(&self) -> Timestamp {
        self.last_message_timestamp
    }
}

impl Client {
    /// Process one incoming heartbeat: promote the sender's believed state
    /// and refresh its freshness record.
    pub(crate) fn handle_heartbeat_message(&mut self, message: &Message, stats: &mut SimStats) {
        let Protocol::Heartbeat(heartbeat) = &mut self.protocol else {
            return;
        };

        if self.buddy_state.get(&message.sender) == Some(&ClientState::Offline) {
            stats.increment_presence_updates();
            let delta = message.timestamp - stats.last_state_switch(message.sender);
            stats.add_convergence_time(delta);
        }

        self.buddy_state.insert(message.sender, ClientState::Online);
        heartbeat
            .last_buddy_update
            .insert(message.sender, message.timestamp);
    }

    /// Emit the next round-robin ping when due, then sweep buddies for
    /// staleness.
    pub(crate) fn run_heartbeat_tasks(
        &mut self,
        now: Timestamp,
        queue: &mut MessageQueue,
        stats: &mut SimStats,
    ) {
        let Protocol::Heartbeat(heartbeat) = &mut self.protocol else {
            return;
        };

        if !self.observers.is_empty() && now - heartbeat.last_message_timestamp > HEARTBEAT_GAP {
            queue.push_back(Message::new(
                self.observers[heartbeat.next_observer],
                self.id,
                now,
                Timestamp::ZERO,
                MessageType::Heartbeat,
                ClientSet::new(),
            ));

            heartbeat.last_message_timestamp = now;
            heartbeat.next_observer += 1;
            if heartbeat.next_observer >= self.observers.len() {
                heartbeat.next_observer = 0;
            }
        }

        // A buddy pings each of its observers once per sweep, so silence is
        // only meaningful after several sweeps' worth of periods.
        let stale_after = HEARTBEAT_PERIOD * (self.observers.len() as u64) * STALENESS_SWEEPS;

        for &buddy in &self.buddies {
            if self.buddy_state.get(&buddy) == Some(&ClientState::Offline) {
                continue;
            }

            let last_update = heartbeat
                .last_buddy_update
                .get(&buddy)
                .copied()
                .unwrap_or(Timestamp::ZERO);

            if now - last_update > stale_after {
                stats.increment_presence_updates();
                let delta = now - stats.last_state_switch(buddy);
                stats.add_convergence_time(delta);
                self.buddy_state.insert(buddy, ClientState::Offline);
            }
        }
    }
}
