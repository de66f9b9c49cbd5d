//! Order types for the board.
//!
//! An order is the only entity the board tracks. It is created once by the
//! intake screen, then mutated in place through partial-field patches as the
//! kitchen and dispatch stations move it through its lifecycle.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TimeOfDay;

/// A customer order as stored in the orders collection.
///
/// The store-assigned `key` is not part of the stored record; it is the key
/// the record lives under and is filled in when a snapshot is decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	/// Store-assigned identifier used for every partial update.
	#[serde(skip)]
	pub key: String,
	/// Name of the customer who placed the order.
	pub customer: String,
	/// Free-form description of what was ordered.
	pub item_text: String,
	/// Calendar day the order was entered on. Sole grouping key.
	pub date: NaiveDate,
	/// Time of day the order was entered.
	pub entry_time: TimeOfDay,
	/// Current lifecycle state. Records written without one read as pending.
	#[serde(default)]
	pub state: OrderState,
	/// Cook assigned when preparation started.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cook: Option<String>,
	/// Courier assigned when the order was dispatched.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub courier: Option<String>,
	/// Time of day preparation started.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub prep_start_time: Option<TimeOfDay>,
	/// Time of day the order was marked ready for dispatch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub prep_done_time: Option<TimeOfDay>,
	/// Set by the intake screen; drives the kitchen notification cue.
	#[serde(default)]
	pub just_created: bool,
}

impl Order {
	/// Decodes a stored record living under `key`.
	pub fn from_record(key: &str, record: serde_json::Value) -> Result<Self, serde_json::Error> {
		let mut order: Order = serde_json::from_value(record)?;
		order.key = key.to_string();
		Ok(order)
	}
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
	/// Entered and waiting for a cook.
	#[default]
	Pending,
	/// A cook has claimed the order.
	InPreparation,
	/// Ready and waiting for a courier.
	Prepared,
	/// Handed to a courier. Terminal.
	Dispatched,
	/// Cancelled by the kitchen. Can be undone back to pending.
	Cancelled,
}

impl OrderState {
	/// Every state, in lifecycle order.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Pending,
			Self::InPreparation,
			Self::Prepared,
			Self::Dispatched,
			Self::Cancelled,
		]
		.into_iter()
	}
}

impl fmt::Display for OrderState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderState::Pending => write!(f, "Pending"),
			OrderState::InPreparation => write!(f, "In preparation"),
			OrderState::Prepared => write!(f, "Prepared"),
			OrderState::Dispatched => write!(f, "Dispatched"),
			OrderState::Cancelled => write!(f, "Cancelled"),
		}
	}
}

/// A user action that moves an order between lifecycle states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TransitionEvent {
	/// A cook claims a pending order.
	AssignCook { identity: String },
	/// The cook marks the order ready for dispatch.
	MarkReady,
	/// A courier takes a prepared order.
	AssignCourier { identity: String },
	/// The order is cancelled.
	Cancel,
	/// A cancelled order goes back to pending.
	Undo,
}

impl TransitionEvent {
	pub fn kind(&self) -> EventKind {
		match self {
			TransitionEvent::AssignCook { .. } => EventKind::AssignCook,
			TransitionEvent::MarkReady => EventKind::MarkReady,
			TransitionEvent::AssignCourier { .. } => EventKind::AssignCourier,
			TransitionEvent::Cancel => EventKind::Cancel,
			TransitionEvent::Undo => EventKind::Undo,
		}
	}
}

/// Payload-free discriminant of a [`TransitionEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
	AssignCook,
	MarkReady,
	AssignCourier,
	Cancel,
	Undo,
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EventKind::AssignCook => write!(f, "assign cook"),
			EventKind::MarkReady => write!(f, "mark ready"),
			EventKind::AssignCourier => write!(f, "assign courier"),
			EventKind::Cancel => write!(f, "cancel"),
			EventKind::Undo => write!(f, "undo"),
		}
	}
}

/// A validated intake submission, ready to be appended to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
	pub customer: String,
	pub item_text: String,
	pub date: NaiveDate,
	pub entry_time: TimeOfDay,
}

impl NewOrder {
	/// Builds the full record written on creation.
	pub fn into_record(self) -> Result<serde_json::Value, serde_json::Error> {
		serde_json::to_value(Order {
			key: String::new(),
			customer: self.customer,
			item_text: self.item_text,
			date: self.date,
			entry_time: self.entry_time,
			state: OrderState::Pending,
			cook: None,
			courier: None,
			prep_start_time: None,
			prep_done_time: None,
			just_created: true,
		})
	}
}

/// The fields a single action writes back to an existing order.
///
/// Unset fields are left out of the serialized patch so the store merges
/// only what the action actually changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderPatch {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub state: Option<OrderState>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub item_text: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub cook: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub courier: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub prep_start_time: Option<TimeOfDay>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub prep_done_time: Option<TimeOfDay>,
}

impl OrderPatch {
	pub fn state(state: OrderState) -> Self {
		Self {
			state: Some(state),
			..Self::default()
		}
	}

	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}

	/// Serializes the patch into the field map handed to the store.
	pub fn to_fields(&self) -> Result<serde_json::Map<String, serde_json::Value>, serde_json::Error> {
		match serde_json::to_value(self)? {
			serde_json::Value::Object(fields) => Ok(fields),
			_ => Ok(serde_json::Map::new()),
		}
	}

	/// Applies the patch to a local copy, mirroring the store's merge.
	pub fn apply_to(&self, order: &mut Order) {
		if let Some(state) = self.state {
			order.state = state;
		}
		if let Some(text) = &self.item_text {
			order.item_text = text.clone();
		}
		if let Some(cook) = &self.cook {
			order.cook = Some(cook.clone());
		}
		if let Some(courier) = &self.courier {
			order.courier = Some(courier.clone());
		}
		if let Some(stamp) = self.prep_start_time {
			order.prep_start_time = Some(stamp);
		}
		if let Some(stamp) = self.prep_done_time {
			order.prep_done_time = Some(stamp);
		}
	}
}
