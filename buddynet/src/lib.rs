//! buddynet - Presence-dissemination protocol state machines.
//!
//! A *buddy network* is a directed random graph in which every client
//! monitors a fixed number of peers (its buddies) and is in turn monitored
//! by whoever picked it (its observers). This crate implements the two
//! protocols that keep each client's local view of buddy liveness current:
//!
//! - **Gossip**: periodic flooding along random observer chains. Each cycle
//!   carries the set of clients that forwarded it; any gossip reaching a
//!   client promotes its whole buddy view to online after a pessimistic
//!   per-cycle reset.
//! - **Heartbeat**: round-robin unicast liveness pings with a multi-sweep
//!   staleness detector that demotes silent buddies.
//!
//! The crate is pure state machinery: no I/O, no clocks, no ambient
//! randomness. The owning simulator passes the message queue, the stats
//! sink, and the RNG into every call, which keeps runs deterministic under
//! a fixed seed.
//!
//! # Module Structure
//!
//! - [`types`] - Core types (ClientId, ClientState, Message, queue aliases)
//! - [`time`] - Timestamp/Duration newtypes in simulated seconds
//! - [`traits`] - The Random capability and test implementations
//! - [`stats`] - The counter sink shared by protocols and simulator
//! - [`client`] - Client record, buddy/observer bookkeeping, dispatch
//! - [`gossip`] - Gossip cycle origination and forwarding
//! - [`heartbeat`] - Heartbeat emission and staleness sweep

pub mod client;
pub mod gossip;
pub mod heartbeat;
pub mod stats;
pub mod time;
pub mod traits;
pub mod types;

// Re-export main types at crate root
pub use client::{Client, Protocol};
pub use gossip::GossipState;
pub use heartbeat::HeartbeatState;
pub use stats::SimStats;
pub use time::{Duration, Timestamp};
pub use traits::Random;
pub use types::{
    ClientId, ClientList, ClientSet, ClientState, ClientStateMap, Message, MessageQueue,
    MessageType,
};

// Re-export protocol constants
pub use types::{
    GOSSIP_FORWARD_BUDGET, GOSSIP_SEED_BUDGET, HEARTBEAT_GAP, HEARTBEAT_PERIOD, STALENESS_SWEEPS,
};
