//! Discrete event simulator for buddy-network presence protocols.
//!
//! The simulator owns the client array, the FIFO message queue, the stats
//! sink, and the sleep schedule. One call to [`Simulator::step`] advances
//! simulated time by one second: protocol tasks fire first, queued messages
//! are dispatched through the lossy channel, and scheduled state toggles
//! are applied last. After the main span a convergence phase forces every
//! client online and measures how accurate each local buddy view ended up.

use std::collections::BTreeSet;

use buddynet::{
    Client, ClientId, ClientState, ClientStateMap, Duration, GossipState, HeartbeatState,
    MessageQueue, Protocol, Random, SimStats, Timestamp,
};
use hashbrown::HashMap;
use tracing::{debug, info};

use crate::config::{
    ConfigError, ProtocolKind, SimConfig, GOSSIP_CADENCE_SECS, PROGRESS_LOG_INTERVAL_SECS,
    SLEEP_RANGE_SECS,
};
use crate::random::SimRandom;
use crate::report::{ConvergenceReport, RunSummary, SimReport};

/// Discrete event simulator for one protocol over one buddy graph.
pub struct Simulator<R = SimRandom> {
    config: SimConfig,
    /// All clients, indexed by id.
    pub(crate) clients: Vec<Client>,
    /// Ids currently online; disjoint from `offline`.
    pub(crate) online: BTreeSet<ClientId>,
    /// Ids currently offline.
    pub(crate) offline: BTreeSet<ClientId>,
    /// Ground-truth state, mirroring each client's own state.
    pub(crate) client_state: ClientStateMap,
    /// In-flight messages, strict FIFO.
    pub(crate) queue: MessageQueue,
    /// Pending state toggles, keyed by fire time.
    pub(crate) sleep_schedule: HashMap<Timestamp, BTreeSet<ClientId>>,
    /// Collected counters.
    pub(crate) stats: SimStats,
    /// The single RNG; its draw order is part of the schedule.
    rng: R,
    /// Current simulated time.
    time_elapsed: Timestamp,
}

impl Simulator<SimRandom> {
    /// Create a simulator with a randomly wired buddy graph, using the
    /// seed from the configuration.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let rng = SimRandom::seeded(config.seed);
        Self::with_rng(config, rng)
    }
}

impl<R: Random> Simulator<R> {
    /// Create a simulator with a randomly wired buddy graph and an
    /// explicit RNG.
    pub fn with_rng(config: SimConfig, rng: R) -> Result<Self, ConfigError> {
        Self::with_random_graph(config, rng, None)
    }

    /// Create a simulator with a randomly wired buddy graph, optionally
    /// pinning every client's initial state instead of drawing it.
    pub fn with_random_graph(
        config: SimConfig,
        rng: R,
        initial_state: Option<ClientState>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut sim = Self::empty(config, rng);
        sim.build_clients(initial_state);
        sim.build_buddy_graph();
        Ok(sim)
    }

    /// Create a simulator with an explicit buddy graph instead of the
    /// random wiring. Each `(owner, buddy)` pair registers the edge and its
    /// observer back-reference. Useful for scripted scenarios.
    pub fn with_graph(
        config: SimConfig,
        rng: R,
        edges: &[(ClientId, ClientId)],
        initial_state: Option<ClientState>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut sim = Self::empty(config, rng);
        sim.build_clients(initial_state);
        for &(owner, buddy) in edges {
            let buddy_state = sim.client_state[&buddy];
            if sim.clients[owner as usize].add_buddy(buddy, buddy_state) {
                sim.clients[buddy as usize].add_observer(owner);
            }
        }
        Ok(sim)
    }

    fn empty(config: SimConfig, rng: R) -> Self {
        Self {
            clients: Vec::with_capacity(config.node_count as usize),
            online: BTreeSet::new(),
            offline: BTreeSet::new(),
            client_state: ClientStateMap::new(),
            queue: MessageQueue::new(),
            sleep_schedule: HashMap::new(),
            stats: SimStats::new(),
            rng,
            time_elapsed: Timestamp::ZERO,
            config,
        }
    }

    /// Construct every client with a random initial state and sleep period,
    /// and register the synthetic t=0 switch for each.
    fn build_clients(&mut self, fixed_state: Option<ClientState>) {
        debug!(nodes = self.config.node_count, "initializing clients");

        for id in 0..self.config.node_count {
            let sleep_period = Duration::from_secs(self.rng.gen_range(0, SLEEP_RANGE_SECS));
            let initial_state = match fixed_state {
                Some(state) => state,
                None => {
                    if self.rng.gen_range(0, 2) == 0 {
                        ClientState::Online
                    } else {
                        ClientState::Offline
                    }
                }
            };

            let protocol = match self.config.protocol {
                ProtocolKind::Gossip => Protocol::Gossip(GossipState::default()),
                ProtocolKind::Heartbeat => Protocol::Heartbeat(HeartbeatState::default()),
            };

            self.clients
                .push(Client::new(id, sleep_period, initial_state, protocol));
            self.sleep_schedule
                .entry(Timestamp::ZERO + sleep_period)
                .or_default()
                .insert(id);

            self.stats
                .record_state_switch(id, Timestamp::ZERO, initial_state);
            self.client_state.insert(id, initial_state);

            match initial_state {
                ClientState::Online => self.online.insert(id),
                ClientState::Offline => self.offline.insert(id),
            };
        }
    }

    /// Wire the random buddy graph: rejection-sample candidates until every
    /// client monitors exactly `buddy_count` distinct peers, registering
    /// observer back-references as edges land.
    fn build_buddy_graph(&mut self) {
        debug!(
            buddies = self.config.buddy_count,
            "generating buddy lists"
        );

        let node_count = self.config.node_count;
        for owner in 0..node_count {
            while self.clients[owner as usize].buddy_count() < self.config.buddy_count as usize {
                let candidate = self.rng.gen_range(0, node_count as u64) as ClientId;
                let candidate_state = self.client_state[&candidate];

                if self.clients[owner as usize].add_buddy(candidate, candidate_state) {
                    self.clients[candidate as usize].add_observer(owner);
                }
            }
        }
    }

    /// Run the main span, the convergence phase, and the final
    /// verification, returning both report blocks.
    pub fn run(&mut self) -> RunSummary {
        let main_end = Timestamp::ZERO + self.config.timespan;
        while self.time_elapsed < main_end {
            self.step();
        }

        let main = SimReport::from_stats(&self.stats, self.config.timespan);
        info!(
            messages_sent = self.stats.messages_sent,
            presence_updates = self.stats.presence_updates,
            "main span complete"
        );

        self.force_all_online();

        let convergence_end = main_end + self.config.convergence_span();
        while self.time_elapsed < convergence_end {
            self.step_convergence();
        }

        self.verify_all();
        let convergence = ConvergenceReport::from_stats(&self.stats);
        info!(accuracy = convergence.accuracy, "convergence phase complete");

        RunSummary { main, convergence }
    }

    /// Advance the main span by one simulated second.
    pub fn step(&mut self) {
        let now = self.time_elapsed;

        match self.config.protocol {
            ProtocolKind::Gossip => {
                if now.as_secs() % GOSSIP_CADENCE_SECS == 0 {
                    self.run_online_tasks(now);
                    self.drain_queue();
                }
            }
            ProtocolKind::Heartbeat => {
                // Per-client dispatch lets each emission gate fire on its
                // own 12-second cadence.
                for id in 0..self.config.node_count {
                    if !self.clients[id as usize].is_online() {
                        continue;
                    }
                    self.clients[id as usize].run_tasks(
                        now,
                        &mut self.queue,
                        &mut self.stats,
                        &mut self.rng,
                    );
                    self.drain_queue();
                }
            }
        }

        self.fire_wakers(now);
        self.advance_time();
    }

    /// One convergence-phase tick: protocol tasks and dispatch only, the
    /// sleep schedule is ignored.
    fn step_convergence(&mut self) {
        let now = self.time_elapsed;

        match self.config.protocol {
            ProtocolKind::Gossip => {
                if now.as_secs() % GOSSIP_CADENCE_SECS == 0 {
                    self.run_online_tasks(now);
                    self.drain_queue();
                }
            }
            ProtocolKind::Heartbeat => {
                for id in 0..self.config.node_count {
                    self.clients[id as usize].run_tasks(
                        now,
                        &mut self.queue,
                        &mut self.stats,
                        &mut self.rng,
                    );
                    self.drain_queue();
                }
            }
        }

        self.advance_time();
    }

    fn advance_time(&mut self) {
        self.time_elapsed += Duration::from_secs(1);
        if self.time_elapsed.as_secs() % PROGRESS_LOG_INTERVAL_SECS == 0 {
            info!(seconds = self.time_elapsed.as_secs(), "simulated seconds elapsed");
        }
    }

    /// Fire `run_tasks` for every online client, in id order.
    fn run_online_tasks(&mut self, now: Timestamp) {
        for &id in &self.online {
            self.clients[id as usize].run_tasks(
                now,
                &mut self.queue,
                &mut self.stats,
                &mut self.rng,
            );
        }
    }

    /// Drain the message queue through the lossy channel. Messages enqueued
    /// during delivery are drained in the same pass.
    fn drain_queue(&mut self) {
        while let Some(message) = self.queue.pop_front() {
            self.stats.increment_messages_sent();

            if self.rng.gen_range(0, 100) < self.config.loss_percent {
                self.stats.increment_messages_dropped();
                continue;
            }

            self.clients[message.recipient as usize].handle_message(
                &message,
                &mut self.queue,
                &mut self.stats,
                &mut self.rng,
            );
        }
    }

    /// Apply every toggle scheduled for this second.
    fn fire_wakers(&mut self, now: Timestamp) {
        if let Some(waking) = self.sleep_schedule.remove(&now) {
            for id in waking {
                self.switch_client_state(id, now);
            }
        }
    }

    /// Toggle one client's ground-truth state and schedule its next toggle
    /// `[1, 4000]` seconds out.
    pub(crate) fn switch_client_state(&mut self, id: ClientId, now: Timestamp) {
        let new_state = self.clients[id as usize].switch_state();

        let sleep = Duration::from_secs(self.rng.gen_range(0, SLEEP_RANGE_SECS) + 1);
        self.sleep_schedule
            .entry(now + sleep)
            .or_default()
            .insert(id);
        self.stats.add_sleep_time(sleep);
        self.stats.increment_sleep_states();

        self.client_state.insert(id, new_state);
        match new_state {
            ClientState::Online => {
                self.offline.remove(&id);
                self.online.insert(id);
            }
            ClientState::Offline => {
                self.online.remove(&id);
                self.offline.insert(id);
            }
        }

        self.stats.record_state_switch(id, now, new_state);
    }

    /// Force every offline client online ahead of the convergence phase.
    ///
    /// Gossip records the forced switch at the current time; the historical
    /// heartbeat behaviour records it at t=0 (see
    /// [`SimConfig::forced_switch_at_epoch`]).
    fn force_all_online(&mut self) {
        let forced_at = match self.config.protocol {
            ProtocolKind::Heartbeat if self.config.forced_switch_at_epoch => Timestamp::ZERO,
            _ => self.time_elapsed,
        };

        for id in 0..self.config.node_count {
            if !self.clients[id as usize].is_online() {
                self.switch_client_state(id, forced_at);
            }
        }
    }

    /// Compare every client's buddy view against ground truth, streaming
    /// record counters into the stats sink.
    fn verify_all(&mut self) {
        for client in &self.clients {
            client.verify_state(&self.client_state, &mut self.stats);
        }
    }

    /// Current simulated time.
    pub fn current_time(&self) -> Timestamp {
        self.time_elapsed
    }

    /// The run configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Get a reference to a client.
    pub fn client(&self, id: ClientId) -> &Client {
        &self.clients[id as usize]
    }

    /// All clients, indexed by id.
    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    /// Ids currently online.
    pub fn online_clients(&self) -> &BTreeSet<ClientId> {
        &self.online
    }

    /// Ids currently offline.
    pub fn offline_clients(&self) -> &BTreeSet<ClientId> {
        &self.offline
    }

    /// Collected counters.
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Number of messages currently in flight.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Every pending wake time for the given client, ascending.
    pub fn scheduled_wakes(&self, id: ClientId) -> Vec<Timestamp> {
        let mut wakes: Vec<Timestamp> = self
            .sleep_schedule
            .iter()
            .filter(|(_, ids)| ids.contains(&id))
            .map(|(&at, _)| at)
            .collect();
        wakes.sort();
        wakes
    }

    /// Panic with a diagnostic if any structural invariant is violated.
    /// Intended for tests; every check here must hold after every tick.
    pub fn check_invariants(&self) {
        let node_count = self.config.node_count as usize;

        assert_eq!(
            self.online.len() + self.offline.len(),
            node_count,
            "online/offline sets must partition the client set"
        );
        for id in &self.online {
            assert!(
                !self.offline.contains(id),
                "client {id} is both online and offline"
            );
        }

        for (index, client) in self.clients.iter().enumerate() {
            let id = index as ClientId;
            assert_eq!(
                client.is_online(),
                self.online.contains(&id),
                "client {id} state disagrees with the online set"
            );
            assert_eq!(
                self.client_state.get(&id),
                Some(&client.state()),
                "ground-truth map is stale for client {id}"
            );

            for &buddy in client.buddies() {
                assert!(
                    self.clients[buddy as usize].has_observer(id),
                    "buddy edge {id} -> {buddy} has no observer back-reference"
                );
            }
        }

        let mut scheduled = hashbrown::HashSet::new();
        for ids in self.sleep_schedule.values() {
            for &id in ids {
                assert!(
                    scheduled.insert(id),
                    "client {id} has two pending wake times"
                );
            }
        }
    }
}
