//! # Mesh Core Library
//!
//! The node-state simulation engine behind the mesh security dashboard.
//!
//! ## Modules
//! - `model`: Nodes, comments and notifications with their wire formats.
//! - `allocator`: The single source of node ids.
//! - `bus`: Append-only notification log with live fan-out.
//! - `transitions`: Pure `(node, action) -> node` status transitions.
//! - `store`: The node collection and its baseline.
//! - `comments`: Moderation threads whose approval drives status changes.
//! - `topology`: Full-mesh edge derivation for renderers.
//! - `simulation`: The session facade tying everything together.
//! - `logs`: Asynchronous log fetching with stale-result discarding.
//! - `session`: Explicit authentication context.
//! - `config`: Layered configuration.

pub mod allocator;
pub mod bus;
pub mod comments;
pub mod config;
pub mod error;
pub mod logs;
pub mod model;
pub mod session;
pub mod simulation;
pub mod store;
pub mod topology;
pub mod transitions;

pub use error::{Result, SimulationError};
pub use simulation::Simulation;
