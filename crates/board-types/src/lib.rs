//! Common types for the order board.
//!
//! This crate defines the data shared by every board component: the order
//! record and its lifecycle states, the partial-field patches written back to
//! the store, the events published by the board, and the configuration
//! validation primitives used by pluggable store backends.

/// Event types published by the board service.
pub mod events;
/// Order records, lifecycle states and write patches.
pub mod order;
/// Registry trait for named, config-selected implementations.
pub mod registry;
/// Snapshot types delivered by the store subscription.
pub mod snapshot;
/// Wall-clock day and time-of-day stamps.
pub mod time;
/// Configuration validation types for backend configuration tables.
pub mod validation;

pub use events::*;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use snapshot::*;
pub use time::*;
pub use validation::*;
