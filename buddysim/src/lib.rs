//! buddysim - Discrete event simulator for buddy-network presence protocols.
//!
//! This crate drives the protocol state machines from `buddynet` through a
//! deterministic, single-threaded event loop to measure how quickly a
//! flooded gossip protocol and a round-robin heartbeat protocol converge on
//! the true liveness of a randomly wired buddy graph.
//!
//! # Features
//!
//! - **Discrete event simulation**: one loop iteration is one simulated
//!   second; no real-time delays, deterministic under a fixed seed
//! - **Two protocols**: gossip (minutely flood bursts) and heartbeat
//!   (per-second round-robin pings)
//! - **Lossy channel**: uniform drop probability applied at dispatch
//! - **Sleep schedule**: every client toggles online/offline on a
//!   randomised timetable
//! - **Convergence phase**: after the main span all clients are forced
//!   online and every local buddy view is scored against ground truth
//! - **Scenario builder**: explicit graphs, pinned initial states, and
//!   zero-loss channels for tests
//!
//! # Example
//!
//! ```
//! use buddysim::{Duration, ScenarioBuilder};
//!
//! let summary = ScenarioBuilder::new(12)
//!     .with_buddy_count(3)
//!     .with_timespan(Duration::from_secs(120))
//!     .with_seed(42)
//!     .run();
//!
//! // Every client's three buddy records were verified.
//! assert_eq!(summary.convergence.total_buddy_records, 36);
//! ```
//!
//! # Architecture
//!
//! The simulator owns the client array, the FIFO message queue, the stats
//! sink, and the sleep schedule; clients receive the queue and sink as
//! capabilities on each call. Within one simulated second, protocol tasks
//! fire first, the queue drains through the lossy channel (messages
//! enqueued mid-drain go out in the same pass), and scheduled state
//! toggles land last.

pub mod config;
pub mod random;
pub mod report;
pub mod scenario;
pub mod sim;

// Re-export main types
pub use buddynet::{ClientId, ClientState, Duration, SimStats, Timestamp};
pub use config::{ConfigError, ProtocolKind, SimConfig};
pub use random::SimRandom;
pub use report::{ConvergenceReport, RunSummary, SimReport};
pub use scenario::{complete_graph_scenario, ScenarioBuilder};
pub use sim::Simulator;

#[cfg(test)]
mod tests {
    use super::*;
    use buddynet::ClientState::Online;

    /// Every online client in a 3-node complete graph originates a burst at
    /// t=0; with a lossless channel, everyone hears about everyone.
    #[test]
    fn test_trivial_origination_floods_complete_graph() {
        let mut sim = complete_graph_scenario(3)
            .all_online()
            .with_loss_percent(0)
            .with_seed(9)
            .build();

        sim.step();

        // 3 originations of 2 seeds each, plus whatever was forwarded.
        assert!(sim.stats().messages_sent >= 6);
        assert_eq!(sim.queue_len(), 0);

        for client in sim.clients() {
            // Every peer appears in the observed chains.
            let gossiped = client.gossip().unwrap().gossiped_nodes();
            for other in 0..3 {
                if other != client.id() {
                    assert!(
                        gossiped.contains(&other),
                        "client {} never saw {} on a chain",
                        client.id(),
                        other
                    );
                }
            }
            // And every buddy is believed online.
            for &buddy in client.buddies() {
                assert_eq!(client.believed_state(buddy), Some(Online));
            }
        }
        sim.check_invariants();
    }

    /// A scheduled toggle fires exactly once and reschedules itself
    /// 1..=4000 seconds out.
    #[test]
    fn test_toggle_schedule_round_trip() {
        let mut sim = ScenarioBuilder::new(10)
            .with_buddy_count(2)
            .all_online()
            .with_seed(17)
            .build();

        let id = 7;
        let wakes = sim.scheduled_wakes(id);
        assert_eq!(wakes.len(), 1);
        let wake = wakes[0];

        while sim.current_time() < wake {
            sim.step();
        }
        assert!(sim.client(id).is_online());
        assert!(sim.online_clients().contains(&id));

        sim.step();

        assert!(!sim.client(id).is_online());
        assert!(sim.offline_clients().contains(&id));

        let next = sim.scheduled_wakes(id);
        assert_eq!(next.len(), 1, "exactly one pending toggle per client");
        assert!(next[0] > wake);
        assert!(next[0] <= wake + Duration::from_secs(4000));

        sim.check_invariants();
    }

    /// Identical config and seed replay the exact same run.
    #[test]
    fn test_runs_are_deterministic_under_seed() {
        let run = || {
            ScenarioBuilder::new(15)
                .with_buddy_count(3)
                .with_timespan(Duration::from_secs(240))
                .with_seed(1234)
                .run()
        };

        let a = run();
        let b = run();

        assert_eq!(a.main.messages_sent, b.main.messages_sent);
        assert_eq!(a.main.messages_dropped, b.main.messages_dropped);
        assert_eq!(a.main.presence_updates, b.main.presence_updates);
        assert_eq!(
            a.convergence.total_correct_buddy_records,
            b.convergence.total_correct_buddy_records
        );
    }

    /// With a lossless channel and everyone forced online, the gossip
    /// convergence phase drives local views to (nearly) global truth.
    #[test]
    fn test_gossip_convergence_accuracy() {
        let summary = ScenarioBuilder::new(40)
            .with_buddy_count(6)
            .with_timespan(Duration::from_secs(600))
            .with_loss_percent(0)
            .with_seed(42)
            .run();

        assert_eq!(summary.convergence.total_buddy_records, 40 * 6);
        assert!(
            summary.convergence.accuracy >= 0.99,
            "gossip accuracy was {}",
            summary.convergence.accuracy
        );
    }

    /// Heartbeat pings keep most buddy views current through the
    /// convergence phase; flapping is possible when a buddy's sweep is much
    /// longer than its observer's staleness window, so the bar is lower
    /// than for gossip.
    #[test]
    fn test_heartbeat_convergence_accuracy() {
        let summary = ScenarioBuilder::new(20)
            .heartbeat()
            .with_buddy_count(4)
            .with_timespan(Duration::from_secs(300))
            .with_loss_percent(0)
            .with_seed(42)
            .run();

        assert_eq!(summary.convergence.total_buddy_records, 20 * 4);
        assert!(
            summary.convergence.accuracy >= 0.8,
            "heartbeat accuracy was {}",
            summary.convergence.accuracy
        );
    }

    /// Heartbeat traffic respects the per-client emission gate: over a
    /// window with everyone online, each client sends at most one ping per
    /// 12-second period.
    #[test]
    fn test_heartbeat_traffic_is_rate_limited() {
        let mut sim = ScenarioBuilder::new(8)
            .heartbeat()
            .with_buddy_count(2)
            .all_online()
            .with_loss_percent(0)
            .with_seed(3)
            .build();

        // Strip the wake schedule so nobody toggles during the window.
        sim.sleep_schedule.clear();
        for _ in 0..120 {
            sim.step();
        }

        // Emissions land at t=12, 24, ..., 108: nine per client at most,
        // and never inside the first period.
        assert!(sim.stats().messages_sent <= 8 * 9);
        sim.check_invariants();
    }

    /// The full run emits both report blocks with consistent figures.
    #[test]
    fn test_run_summary_consistency() {
        let summary = ScenarioBuilder::new(12)
            .heartbeat()
            .with_buddy_count(3)
            .with_timespan(Duration::from_secs(200))
            .with_seed(5)
            .run();

        assert!(summary.main.messages_sent >= summary.main.messages_dropped);
        assert!(summary.convergence.total_correct_buddy_records <= summary.convergence.total_buddy_records);
        assert!((0.0..=1.0).contains(&summary.convergence.accuracy));
    }
}
