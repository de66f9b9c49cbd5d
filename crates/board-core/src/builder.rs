//! Builder for constructing an [`OrderBoard`].
//!
//! The store backend is picked by name from the configuration and created
//! through a factory function, so backends can be swapped without touching
//! the board.

use crate::board::OrderBoard;
use crate::clock::{Clock, SystemClock};
use board_config::Config;
use board_store::{get_all_implementations, StoreFactory, StoreService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while building a board.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions available to the builder, keyed by implementation name.
pub struct BoardFactories {
	pub store_factories: HashMap<String, StoreFactory>,
}

impl BoardFactories {
	/// Every store backend this crate ships with.
	pub fn registered() -> Self {
		Self {
			store_factories: get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}
}

/// Builder for an [`OrderBoard`] with a pluggable store and clock.
pub struct BoardBuilder {
	config: Config,
	clock: Option<Arc<dyn Clock>>,
}

impl BoardBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			clock: None,
		}
	}

	/// Overrides the wall clock. Defaults to the system clock at the
	/// configured UTC offset.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = Some(clock);
		self
	}

	/// Builds the board. The board still has to be started.
	pub fn build(self, factories: BoardFactories) -> Result<OrderBoard, BuilderError> {
		let primary = &self.config.store.primary;
		let store_config = self.config.primary_store().ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary store '{}' has no configuration section",
				primary
			))
		})?;
		let factory = factories
			.store_factories
			.get(primary)
			.ok_or_else(|| BuilderError::MissingComponent(format!("store '{}'", primary)))?;

		let backend = match factory(store_config) {
			Ok(backend) => {
				tracing::info!(component = "store", implementation = %primary, "Loaded");
				backend
			},
			Err(e) => {
				tracing::error!(
					component = "store",
					implementation = %primary,
					error = %e,
					"Failed to create store implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create store implementation '{}': {}",
					primary, e
				)));
			},
		};

		let clock = match self.clock {
			Some(clock) => clock,
			None => {
				let offset = self.config.board.utc_offset_minutes;
				let clock = SystemClock::from_offset_minutes(offset).ok_or_else(|| {
					BuilderError::Config(format!("Invalid UTC offset: {} minutes", offset))
				})?;
				Arc::new(clock) as Arc<dyn Clock>
			},
		};

		Ok(OrderBoard::new(
			self.config,
			Arc::new(StoreService::new(backend)),
			clock,
		))
	}
}
