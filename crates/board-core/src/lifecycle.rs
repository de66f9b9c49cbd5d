//! Order lifecycle state machine.
//!
//! The transition table below is the single authority on which actions an
//! order accepts in each state. Every function here is pure: it inspects an
//! order and returns the patch the action would write, or the reason the
//! action is refused. Nothing is written unless a patch is returned.
//!
//! Identities and time stamps are write-once. An order that is cancelled and
//! then restored keeps its cook, courier and stamps, and claiming it again
//! resumes with the values first written.

use board_types::{
	BoardInstant, EventKind, NewOrder, Order, OrderPatch, OrderState, TimeOfDay, TransitionEvent,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use thiserror::Error;

/// Reasons an action is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
	#[error("{0} cannot be empty")]
	EmptyField(&'static str),
	#[error("Invalid transition: cannot {event} an order in state {from:?}")]
	InvalidTransition { from: OrderState, event: EventKind },
	#[error("Item text cannot be edited while the order is in state {state:?}")]
	NotEditable { state: OrderState },
	#[error("Order not found: {0}")]
	OrderNotFound(String),
}

/// Static transition table: state -> (event -> next state).
static TRANSITIONS: Lazy<HashMap<OrderState, HashMap<EventKind, OrderState>>> = Lazy::new(|| {
	use EventKind::*;
	use OrderState::*;

	let mut m = HashMap::new();
	m.insert(
		Pending,
		HashMap::from([(AssignCook, InPreparation), (Cancel, Cancelled)]),
	);
	m.insert(
		InPreparation,
		HashMap::from([(MarkReady, Prepared), (Cancel, Cancelled)]),
	);
	m.insert(
		Prepared,
		HashMap::from([(AssignCourier, Dispatched), (Cancel, Cancelled)]),
	);
	m.insert(Dispatched, HashMap::new()); // terminal
	m.insert(Cancelled, HashMap::from([(Undo, Pending)]));
	m
});

/// The state `event` leads to from `from`, if the table allows it.
pub fn target_state(from: OrderState, event: EventKind) -> Option<OrderState> {
	TRANSITIONS
		.get(&from)
		.and_then(|edges| edges.get(&event))
		.copied()
}

/// Events accepted in `state`, in a stable order.
pub fn allowed_events(state: OrderState) -> Vec<EventKind> {
	let mut events: Vec<EventKind> = TRANSITIONS
		.get(&state)
		.map(|edges| edges.keys().copied().collect())
		.unwrap_or_default();
	events.sort();
	events
}

/// Whether the item text may be edited in `state`.
pub fn item_editable(state: OrderState) -> bool {
	matches!(state, OrderState::Pending | OrderState::InPreparation)
}

fn required(field: &'static str, value: &str) -> Result<String, LifecycleError> {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		return Err(LifecycleError::EmptyField(field));
	}
	Ok(trimmed.to_string())
}

/// Computes the patch `event` writes to `order`, stamped with `now`.
pub fn plan_transition(
	order: &Order,
	event: &TransitionEvent,
	now: TimeOfDay,
) -> Result<OrderPatch, LifecycleError> {
	let to = target_state(order.state, event.kind()).ok_or(LifecycleError::InvalidTransition {
		from: order.state,
		event: event.kind(),
	})?;

	let mut patch = OrderPatch::state(to);
	match event {
		TransitionEvent::AssignCook { identity } => {
			let cook = required("cook", identity)?;
			if order.cook.is_none() {
				patch.cook = Some(cook);
			}
			if order.prep_start_time.is_none() {
				patch.prep_start_time = Some(now);
			}
		},
		TransitionEvent::MarkReady => {
			if order.prep_done_time.is_none() {
				patch.prep_done_time = Some(now);
			}
		},
		TransitionEvent::AssignCourier { identity } => {
			let courier = required("courier", identity)?;
			if order.courier.is_none() {
				patch.courier = Some(courier);
			}
		},
		TransitionEvent::Cancel | TransitionEvent::Undo => {},
	}

	Ok(patch)
}

/// Computes the patch replacing the item text of `order`.
pub fn plan_item_edit(order: &Order, item_text: &str) -> Result<OrderPatch, LifecycleError> {
	if !item_editable(order.state) {
		return Err(LifecycleError::NotEditable { state: order.state });
	}
	Ok(OrderPatch {
		item_text: Some(required("item_text", item_text)?),
		..OrderPatch::default()
	})
}

/// Validates an intake submission and stamps it with `now`.
pub fn plan_intake(
	customer: &str,
	item_text: &str,
	now: BoardInstant,
) -> Result<NewOrder, LifecycleError> {
	Ok(NewOrder {
		customer: required("customer", customer)?,
		item_text: required("item_text", item_text)?,
		date: now.date,
		entry_time: now.time,
	})
}
