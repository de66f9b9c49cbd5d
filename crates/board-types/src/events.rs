//! Event types published by the board.
//!
//! Events flow through the board's event bus so that stations and loggers can
//! react to what happened without polling the store.

use serde::{Deserialize, Serialize};

use crate::{EventKind, OrderState};

/// Something the board did or refused to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardEvent {
	/// The intake screen appended a new order.
	OrderCreated { key: String },
	/// A lifecycle transition was written.
	OrderTransitioned {
		key: String,
		from: OrderState,
		to: OrderState,
	},
	/// The item text of an order was edited.
	ItemEdited { key: String },
	/// An action was refused before anything was written.
	ActionRejected { key: Option<String>, reason: String },
	/// A freshly created order arrived for today; kitchens should play their cue.
	NewOrderCue { key: String },
	/// A new snapshot was received from the store.
	SnapshotApplied { orders: usize },
}

impl BoardEvent {
	pub fn rejected(key: Option<&str>, event: Option<EventKind>, reason: impl ToString) -> Self {
		let reason = match event {
			Some(kind) => format!("{}: {}", kind, reason.to_string()),
			None => reason.to_string(),
		};
		BoardEvent::ActionRejected {
			key: key.map(str::to_string),
			reason,
		}
	}
}
