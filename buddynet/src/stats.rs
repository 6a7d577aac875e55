//! Counter aggregation for simulation analysis.
//!
//! The sink is owned by the simulator and handed to clients as an
//! increment-only capability. Besides the raw counters it remembers, per
//! client, the time and direction of the most recent ground-truth state
//! switch; the protocols consult that memory when crediting presence
//! updates and convergence deltas.

use hashbrown::HashMap;

use crate::time::{Duration, Timestamp};
use crate::types::{ClientId, ClientState};

/// Aggregated counters for one simulation run.
#[derive(Debug, Clone, Default)]
pub struct SimStats {
    /// Local belief changes credited by a protocol.
    pub presence_updates: u64,
    /// Sum of per-update convergence deltas.
    pub total_convergence_time: Duration,
    /// Every dequeue from the message queue.
    pub messages_sent: u64,
    /// Messages dropped by the lossy channel.
    pub messages_dropped: u64,
    /// Buddy records examined during verification.
    pub total_buddy_records: u64,
    /// Buddy records whose believed state matched ground truth.
    pub total_correct_buddy_records: u64,
    /// Sum of all drawn sleep durations.
    pub total_sleep_time: Duration,
    /// Number of state switches performed.
    pub sleep_states: u64,

    /// Timestamp of each client's most recent switch (default 0).
    last_switch: HashMap<ClientId, Timestamp>,
    /// State each client most recently switched to.
    last_state: HashMap<ClientId, ClientState>,
}

impl SimStats {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_convergence_time(&mut self, delta: Duration) {
        self.total_convergence_time += delta;
    }

    pub fn add_sleep_time(&mut self, duration: Duration) {
        self.total_sleep_time += duration;
    }

    pub fn increment_presence_updates(&mut self) {
        self.presence_updates += 1;
    }

    pub fn increment_messages_sent(&mut self) {
        self.messages_sent += 1;
    }

    pub fn increment_messages_dropped(&mut self) {
        self.messages_dropped += 1;
    }

    pub fn increment_buddy_records(&mut self) {
        self.total_buddy_records += 1;
    }

    pub fn increment_correct_buddy_records(&mut self) {
        self.total_correct_buddy_records += 1;
    }

    pub fn increment_sleep_states(&mut self) {
        self.sleep_states += 1;
    }

    /// Record a ground-truth state switch, including the synthetic switch
    /// every client receives at construction time.
    pub fn record_state_switch(&mut self, id: ClientId, at: Timestamp, state: ClientState) {
        self.last_switch.insert(id, at);
        self.last_state.insert(id, state);
    }

    /// Timestamp of the client's most recent switch, 0 if never recorded.
    pub fn last_state_switch(&self, id: ClientId) -> Timestamp {
        self.last_switch.get(&id).copied().unwrap_or(Timestamp::ZERO)
    }

    /// State the client most recently switched to. Defaults to `Online`
    /// before the first recorded switch.
    pub fn last_state(&self, id: ClientId) -> ClientState {
        self.last_state.get(&id).copied().unwrap_or(ClientState::Online)
    }

    /// Mean convergence delta per presence update, 0 with no updates.
    pub fn mean_convergence_time(&self) -> Duration {
        if self.presence_updates == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(self.total_convergence_time.as_secs() / self.presence_updates)
        }
    }

    /// Mean drawn sleep duration, 0 with no switches.
    pub fn mean_sleep_time(&self) -> Duration {
        if self.sleep_states == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(self.total_sleep_time.as_secs() / self.sleep_states)
        }
    }

    /// Fraction of verified buddy records that matched ground truth.
    ///
    /// 0.0 when nothing was verified (e.g. a run with no buddies).
    pub fn accuracy(&self) -> f64 {
        if self.total_buddy_records == 0 {
            0.0
        } else {
            self.total_correct_buddy_records as f64 / self.total_buddy_records as f64
        }
    }

    /// Messages dequeued per simulated second.
    pub fn messages_per_second(&self, elapsed: Duration) -> f64 {
        if elapsed == Duration::ZERO {
            0.0
        } else {
            self.messages_sent as f64 / elapsed.as_secs() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = SimStats::new();
        assert_eq!(stats.presence_updates, 0);
        assert_eq!(stats.messages_sent, 0);
        assert_eq!(stats.total_convergence_time, Duration::ZERO);
        assert_eq!(stats.accuracy(), 0.0);
    }

    #[test]
    fn test_state_switch_memory() {
        let mut stats = SimStats::new();

        // Unrecorded clients read as "switched to Online at t=0".
        assert_eq!(stats.last_state_switch(9), Timestamp::ZERO);
        assert_eq!(stats.last_state(9), ClientState::Online);

        stats.record_state_switch(9, Timestamp::from_secs(120), ClientState::Offline);
        assert_eq!(stats.last_state_switch(9), Timestamp::from_secs(120));
        assert_eq!(stats.last_state(9), ClientState::Offline);

        // A later switch overwrites, never accumulates.
        stats.record_state_switch(9, Timestamp::from_secs(500), ClientState::Online);
        assert_eq!(stats.last_state_switch(9), Timestamp::from_secs(500));
        assert_eq!(stats.last_state(9), ClientState::Online);
    }

    #[test]
    fn test_mean_convergence_time() {
        let mut stats = SimStats::new();
        assert_eq!(stats.mean_convergence_time(), Duration::ZERO);

        stats.increment_presence_updates();
        stats.add_convergence_time(Duration::from_secs(10));
        stats.increment_presence_updates();
        stats.add_convergence_time(Duration::from_secs(30));

        assert_eq!(stats.mean_convergence_time(), Duration::from_secs(20));
    }

    #[test]
    fn test_mean_sleep_time() {
        let mut stats = SimStats::new();
        assert_eq!(stats.mean_sleep_time(), Duration::ZERO);

        stats.add_sleep_time(Duration::from_secs(1000));
        stats.increment_sleep_states();
        stats.add_sleep_time(Duration::from_secs(3000));
        stats.increment_sleep_states();

        assert_eq!(stats.mean_sleep_time(), Duration::from_secs(2000));
    }

    #[test]
    fn test_accuracy() {
        let mut stats = SimStats::new();
        for _ in 0..4 {
            stats.increment_buddy_records();
        }
        for _ in 0..3 {
            stats.increment_correct_buddy_records();
        }
        assert!((stats.accuracy() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_messages_per_second() {
        let mut stats = SimStats::new();
        assert_eq!(stats.messages_per_second(Duration::ZERO), 0.0);

        for _ in 0..100 {
            stats.increment_messages_sent();
        }
        assert!((stats.messages_per_second(Duration::from_secs(50)) - 2.0).abs() < f64::EPSILON);
    }
}
