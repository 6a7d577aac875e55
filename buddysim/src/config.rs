//! Simulation configuration and validation.

use buddynet::Duration;
use thiserror::Error;

/// Chance, in percent, that a dequeued message is dropped.
pub const DEFAULT_LOSS_PERCENT: u64 = 5;

/// Initial sleep periods are drawn from `[0, SLEEP_RANGE_SECS)`;
/// rescheduled ones from `[1, SLEEP_RANGE_SECS]`.
pub const SLEEP_RANGE_SECS: u64 = 4000;

/// Gossip cycles are originated once per this many simulated seconds.
pub const GOSSIP_CADENCE_SECS: u64 = 60;

/// Extra ticks run after the main span with every client forced online.
pub const GOSSIP_CONVERGENCE_SPAN: Duration = Duration::from_secs(1200);
pub const HEARTBEAT_CONVERGENCE_SPAN: Duration = Duration::from_secs(2200);

/// Progress is logged every this many simulated seconds.
pub const PROGRESS_LOG_INTERVAL_SECS: u64 = 10_000;

/// Which protocol the simulated clients speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolKind {
    Gossip,
    Heartbeat,
}

/// Configuration rejected before the simulation starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("node count must be non-zero")]
    NoClients,

    #[error("buddy count {buddy_count} must be less than node count {node_count}")]
    BuddyCountTooLarge { buddy_count: u32, node_count: u32 },

    #[error("loss percent {0} must be at most 100")]
    LossOutOfRange(u64),
}

/// Full configuration for one simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub protocol: ProtocolKind,
    pub node_count: u32,
    pub buddy_count: u32,
    /// Length of the main span in simulated seconds.
    pub timespan: Duration,
    /// RNG seed; runs with equal config and seed are identical.
    pub seed: u64,
    /// Chance in percent that a dequeued message is dropped.
    pub loss_percent: u64,
    /// Record forced switches during the heartbeat convergence phase at
    /// t=0 instead of the current time. Matches the historical behaviour;
    /// tests disable it to keep switch memory intact.
    pub forced_switch_at_epoch: bool,
}

impl SimConfig {
    /// Create a configuration with default seed, loss, and quirk settings.
    pub fn new(
        protocol: ProtocolKind,
        node_count: u32,
        buddy_count: u32,
        timespan: Duration,
    ) -> Self {
        Self {
            protocol,
            node_count,
            buddy_count,
            timespan,
            seed: 42,
            loss_percent: DEFAULT_LOSS_PERCENT,
            forced_switch_at_epoch: protocol == ProtocolKind::Heartbeat,
        }
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the channel loss percentage.
    pub fn with_loss_percent(mut self, percent: u64) -> Self {
        self.loss_percent = percent;
        self
    }

    /// Enable or disable the historical forced-switch-at-epoch behaviour.
    pub fn with_forced_switch_at_epoch(mut self, enabled: bool) -> Self {
        self.forced_switch_at_epoch = enabled;
        self
    }

    /// Reject impossible configurations up front; the graph build would
    /// otherwise never terminate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_count == 0 {
            return Err(ConfigError::NoClients);
        }
        if self.buddy_count >= self.node_count {
            return Err(ConfigError::BuddyCountTooLarge {
                buddy_count: self.buddy_count,
                node_count: self.node_count,
            });
        }
        if self.loss_percent > 100 {
            return Err(ConfigError::LossOutOfRange(self.loss_percent));
        }
        Ok(())
    }

    /// How long the post-span convergence phase runs for this protocol.
    pub fn convergence_span(&self) -> Duration {
        match self.protocol {
            ProtocolKind::Gossip => GOSSIP_CONVERGENCE_SPAN,
            ProtocolKind::Heartbeat => HEARTBEAT_CONVERGENCE_SPAN,
        }
    }
}
