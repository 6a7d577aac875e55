//! Scenario builder for setting up and running simulations.

use buddynet::{ClientId, ClientState, Duration, Random};

use crate::config::{ProtocolKind, SimConfig};
use crate::random::SimRandom;
use crate::report::RunSummary;
use crate::sim::Simulator;

/// Builder for simulation scenarios.
///
/// Defaults to the gossip protocol with 5 buddies per client, seed 42, the
/// standard 5% channel loss, and a 1-hour main span. Every knob can be
/// overridden; `with_edges` replaces the random buddy graph with an
/// explicit one for scripted tests.
pub struct ScenarioBuilder {
    /// Number of clients to create.
    num_nodes: u32,
    /// Buddies per client for the random graph.
    buddy_count: u32,
    /// Which protocol the clients speak.
    protocol: ProtocolKind,
    /// RNG seed for determinism.
    seed: u64,
    /// Channel loss in percent.
    loss_percent: u64,
    /// Main span length.
    timespan: Duration,
    /// Fixed initial state, None for the usual random draw.
    initial_state: Option<ClientState>,
    /// Explicit buddy edges, None for the random graph.
    edges: Option<Vec<(ClientId, ClientId)>>,
    /// Historical forced-switch-at-epoch behaviour for heartbeat.
    forced_switch_at_epoch: bool,
}

impl ScenarioBuilder {
    /// Create a scenario with the specified number of clients.
    pub fn new(num_nodes: u32) -> Self {
        Self {
            num_nodes,
            buddy_count: 5,
            protocol: ProtocolKind::Gossip,
            seed: 42,
            loss_percent: crate::config::DEFAULT_LOSS_PERCENT,
            timespan: Duration::from_hours(1),
            initial_state: None,
            edges: None,
            forced_switch_at_epoch: true,
        }
    }

    /// Use the gossip protocol (the default).
    pub fn gossip(mut self) -> Self {
        self.protocol = ProtocolKind::Gossip;
        self
    }

    /// Use the heartbeat protocol.
    pub fn heartbeat(mut self) -> Self {
        self.protocol = ProtocolKind::Heartbeat;
        self
    }

    /// Set the RNG seed for deterministic simulation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of buddies each client monitors.
    pub fn with_buddy_count(mut self, buddy_count: u32) -> Self {
        self.buddy_count = buddy_count;
        self
    }

    /// Set the main span length.
    pub fn with_timespan(mut self, timespan: Duration) -> Self {
        self.timespan = timespan;
        self
    }

    /// Set the channel loss percentage (0 disables loss).
    pub fn with_loss_percent(mut self, percent: u64) -> Self {
        self.loss_percent = percent;
        self
    }

    /// Start every client online instead of drawing random states.
    pub fn all_online(mut self) -> Self {
        self.initial_state = Some(ClientState::Online);
        self
    }

    /// Start every client offline instead of drawing random states.
    pub fn all_offline(mut self) -> Self {
        self.initial_state = Some(ClientState::Offline);
        self
    }

    /// Replace the random buddy graph with explicit `(owner, buddy)` edges.
    pub fn with_edges(mut self, edges: Vec<(ClientId, ClientId)>) -> Self {
        self.edges = Some(edges);
        self
    }

    /// Disable the historical t=0 forced-switch behaviour in the heartbeat
    /// convergence phase.
    pub fn without_epoch_forced_switches(mut self) -> Self {
        self.forced_switch_at_epoch = false;
        self
    }

    fn config(&self) -> SimConfig {
        SimConfig::new(
            self.protocol,
            self.num_nodes,
            self.buddy_count,
            self.timespan,
        )
        .with_seed(self.seed)
        .with_loss_percent(self.loss_percent)
        .with_forced_switch_at_epoch(
            self.protocol == ProtocolKind::Heartbeat && self.forced_switch_at_epoch,
        )
    }

    /// Build the simulator with the default seeded RNG.
    ///
    /// Panics on an invalid configuration; scenarios are test fixtures and
    /// a bad one is a programming error.
    pub fn build(self) -> Simulator {
        let rng = SimRandom::seeded(self.seed);
        self.build_with_rng(rng)
    }

    /// Build the simulator with an explicit RNG.
    pub fn build_with_rng<R: Random>(self, rng: R) -> Simulator<R> {
        let config = self.config();
        match self.edges {
            Some(edges) => Simulator::with_graph(config, rng, &edges, self.initial_state)
                .expect("invalid scenario configuration"),
            None => Simulator::with_random_graph(config, rng, self.initial_state)
                .expect("invalid scenario configuration"),
        }
    }

    /// Build and run the full simulation, returning both reports.
    pub fn run(self) -> RunSummary {
        let mut sim = self.build();
        sim.run()
    }
}

/// Convenience function: a small fully-wired gossip scenario where every
/// client monitors every other client.
pub fn complete_graph_scenario(num_nodes: u32) -> ScenarioBuilder {
    let mut edges = Vec::new();
    for owner in 0..num_nodes {
        for buddy in 0..num_nodes {
            if owner != buddy {
                edges.push((owner, buddy));
            }
        }
    }

    ScenarioBuilder::new(num_nodes)
        .with_buddy_count(num_nodes.saturating_sub(1))
        .with_edges(edges)
}
