//! Core of the order board.
//!
//! The lifecycle engine ([`lifecycle`], [`partition`]) is a set of pure
//! functions over immutable snapshots: it decides which transitions an order
//! may take and what each one writes, and it groups, orders and numbers
//! orders by day. The [`views`] module projects that output into the kitchen
//! and dispatch screens. [`OrderBoard`] wires the store subscription to the
//! engine and turns user actions into store writes.

pub mod board;
pub mod builder;
pub mod clock;
pub mod event_bus;
pub mod lifecycle;
pub mod partition;
pub mod views;

pub use board::{BoardError, OrderBoard};
pub use builder::{BoardBuilder, BoardFactories, BuilderError};
pub use clock::{Clock, FixedClock, SystemClock};
pub use event_bus::EventBus;
pub use lifecycle::LifecycleError;
pub use partition::{NumberedOrder, Partition, Partitioned};
