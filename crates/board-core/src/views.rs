//! Station view projections.
//!
//! Each projection is a pure function of an immutable [`Partitioned`] value,
//! the staff rosters and the current day. Controls are derived from the
//! lifecycle table, so a view never offers an action the engine would refuse.

use board_config::StaffConfig;
use board_types::{EventKind, OrderPatch, OrderState, TimeOfDay};
use chrono::NaiveDate;
use serde::Serialize;

use crate::lifecycle::{self, LifecycleError};
use crate::partition::{NumberedOrder, Partition, Partitioned};

/// Shown by the kitchen when a partition holds no orders.
pub const EMPTY_KITCHEN_MESSAGE: &str = "No orders yet.";

/// Background and border colours for a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateStyle {
	pub background: &'static str,
	pub border: &'static str,
}

impl StateStyle {
	pub fn for_state(state: OrderState) -> Self {
		let (background, border) = match state {
			OrderState::Pending => ("#d1ecf1", "#0c5460"),
			OrderState::InPreparation => ("#fff3cd", "#856404"),
			OrderState::Prepared => ("#d4edda", "#155724"),
			OrderState::Dispatched => ("rgba(40, 167, 69, 0.7)", "#155724"),
			OrderState::Cancelled => ("#f8d7da", "#721c24"),
		};
		Self { background, border }
	}
}

/// An action a station may offer on a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum Control {
	/// Pick a cook from the roster.
	AssignCook { options: Vec<String> },
	MarkReady,
	/// Pick a courier from the roster.
	AssignCourier { options: Vec<String> },
	Cancel,
	Undo,
}

impl Control {
	pub fn kind(&self) -> EventKind {
		match self {
			Control::AssignCook { .. } => EventKind::AssignCook,
			Control::MarkReady => EventKind::MarkReady,
			Control::AssignCourier { .. } => EventKind::AssignCourier,
			Control::Cancel => EventKind::Cancel,
			Control::Undo => EventKind::Undo,
		}
	}

	fn for_event(kind: EventKind, staff: &StaffConfig) -> Self {
		match kind {
			EventKind::AssignCook => Control::AssignCook {
				options: staff.cooks.clone(),
			},
			EventKind::MarkReady => Control::MarkReady,
			EventKind::AssignCourier => Control::AssignCourier {
				options: staff.couriers.clone(),
			},
			EventKind::Cancel => Control::Cancel,
			EventKind::Undo => Control::Undo,
		}
	}
}

/// One order as the kitchen sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KitchenRow {
	pub display_id: usize,
	pub key: String,
	pub date: NaiveDate,
	pub customer: String,
	pub item_text: String,
	pub entry_time: TimeOfDay,
	pub state: OrderState,
	pub state_label: String,
	pub cook: Option<String>,
	pub courier: Option<String>,
	pub prep_start_time: Option<TimeOfDay>,
	pub prep_done_time: Option<TimeOfDay>,
	pub style: StateStyle,
	pub struck_through: bool,
	pub editable: bool,
	pub controls: Vec<Control>,
}

/// The kitchen screen for one partition, most recent order first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KitchenView {
	pub partition: Partition,
	pub rows: Vec<KitchenRow>,
	/// Play the new-order cue.
	pub notify: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub empty_message: Option<&'static str>,
}

/// One order as the dispatch list sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchRow {
	pub display_id: usize,
	pub key: String,
	pub date: NaiveDate,
	pub customer: String,
	pub item_text: String,
	pub entry_time: TimeOfDay,
	pub state: OrderState,
	pub state_label: String,
	/// Only shown while the order is being prepared.
	pub cook: Option<String>,
	pub courier: Option<String>,
	pub style: StateStyle,
	pub struck_through: bool,
	pub highlighted: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub control: Option<Control>,
}

/// The dispatch list, oldest order first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchView {
	pub rows: Vec<DispatchRow>,
	pub couriers: Vec<String>,
}

fn kitchen_row(numbered: &NumberedOrder, staff: &StaffConfig) -> KitchenRow {
	let order = &numbered.order;
	KitchenRow {
		display_id: numbered.display_id,
		key: numbered.key.clone(),
		date: order.date,
		customer: order.customer.clone(),
		item_text: order.item_text.clone(),
		entry_time: order.entry_time,
		state: order.state,
		state_label: order.state.to_string(),
		cook: order.cook.clone(),
		courier: order.courier.clone(),
		prep_start_time: order.prep_start_time,
		prep_done_time: order.prep_done_time,
		style: StateStyle::for_state(order.state),
		struck_through: order.state == OrderState::Cancelled,
		editable: lifecycle::item_editable(order.state),
		controls: lifecycle::allowed_events(order.state)
			.into_iter()
			.map(|kind| Control::for_event(kind, staff))
			.collect(),
	}
}

/// Projects the kitchen screen for `partition`.
pub fn kitchen_view(
	parts: &Partitioned,
	partition: Partition,
	staff: &StaffConfig,
	today: NaiveDate,
) -> KitchenView {
	let orders = parts.get(partition);

	let notify = orders
		.last()
		.map(|newest| newest.order.just_created && newest.order.date == today)
		.unwrap_or(false);

	let rows: Vec<KitchenRow> = orders
		.iter()
		.rev()
		.map(|numbered| kitchen_row(numbered, staff))
		.collect();

	KitchenView {
		partition,
		empty_message: rows.is_empty().then_some(EMPTY_KITCHEN_MESSAGE),
		rows,
		notify,
	}
}

/// Projects the dispatch list over today's orders, oldest first.
pub fn dispatch_view(parts: &Partitioned, staff: &StaffConfig) -> DispatchView {
	let rows = parts
		.get(Partition::Today)
		.iter()
		.map(|numbered| {
			let order = &numbered.order;
			let prepared = order.state == OrderState::Prepared;
			DispatchRow {
				display_id: numbered.display_id,
				key: numbered.key.clone(),
				date: order.date,
				customer: order.customer.clone(),
				item_text: order.item_text.clone(),
				entry_time: order.entry_time,
				state: order.state,
				state_label: order.state.to_string(),
				cook: order
					.cook
					.clone()
					.filter(|_| order.state == OrderState::InPreparation),
				courier: order.courier.clone(),
				style: StateStyle::for_state(order.state),
				struck_through: order.state == OrderState::Cancelled,
				highlighted: prepared,
				control: prepared.then(|| Control::for_event(EventKind::AssignCourier, staff)),
			}
		})
		.collect();

	DispatchView {
		rows,
		couriers: staff.couriers.clone(),
	}
}

/// A station's in-progress edit of one order's item text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
	key: String,
	original: String,
	text: String,
}

impl EditSession {
	/// Opens an edit buffer for `row`, if its state allows editing.
	pub fn begin(row: &KitchenRow) -> Result<Self, LifecycleError> {
		if !row.editable {
			return Err(LifecycleError::NotEditable { state: row.state });
		}
		Ok(Self {
			key: row.key.clone(),
			original: row.item_text.clone(),
			text: row.item_text.clone(),
		})
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn set_text(&mut self, text: impl Into<String>) {
		self.text = text.into();
	}

	/// Closes the buffer, producing the patch to write. `None` when nothing
	/// changed.
	pub fn save(self) -> Result<Option<(String, OrderPatch)>, LifecycleError> {
		let text = self.text.trim();
		if text.is_empty() {
			return Err(LifecycleError::EmptyField("item_text"));
		}
		if text == self.original {
			return Ok(None);
		}
		let patch = OrderPatch {
			item_text: Some(text.to_string()),
			..OrderPatch::default()
		};
		Ok(Some((self.key, patch)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::partition::partition;
	use board_types::{Order, Snapshot};

	fn staff() -> StaffConfig {
		StaffConfig {
			cooks: vec!["Luis".into(), "Maria".into()],
			couriers: vec!["Carlos".into(), "Daniel".into()],
		}
	}

	fn today() -> NaiveDate {
		NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
	}

	fn order(key: &str, entry: &str, state: OrderState) -> Order {
		Order {
			key: key.into(),
			customer: "Ana".into(),
			item_text: "2 tacos".into(),
			date: today(),
			entry_time: entry.parse().unwrap(),
			state,
			cook: None,
			courier: None,
			prep_start_time: None,
			prep_done_time: None,
			just_created: false,
		}
	}

	#[test]
	fn test_kitchen_view_is_most_recent_first() {
		let snapshot = Snapshot::from_orders([
			order("a", "09:00:00", OrderState::Pending),
			order("b", "09:05:00", OrderState::Pending),
			order("c", "09:10:00", OrderState::Pending),
		]);
		let parts = partition(&snapshot, today());
		let view = kitchen_view(&parts, Partition::Today, &staff(), today());

		let ids: Vec<_> = view.rows.iter().map(|r| r.display_id).collect();
		assert_eq!(ids, vec![3, 2, 1]);
		assert!(view.empty_message.is_none());
		assert!(!view.notify);
	}

	#[test]
	fn test_kitchen_controls_follow_state() {
		let mut cooking = order("b", "09:05:00", OrderState::InPreparation);
		cooking.cook = Some("Luis".into());
		let snapshot = Snapshot::from_orders([
			order("a", "09:00:00", OrderState::Pending),
			cooking,
			order("c", "09:10:00", OrderState::Dispatched),
			order("d", "09:15:00", OrderState::Cancelled),
		]);
		let parts = partition(&snapshot, today());
		let view = kitchen_view(&parts, Partition::Today, &staff(), today());
		let row = |key: &str| view.rows.iter().find(|r| r.key == key).unwrap();

		assert_eq!(
			row("a").controls,
			vec![
				Control::AssignCook {
					options: vec!["Luis".into(), "Maria".into()]
				},
				Control::Cancel
			]
		);
		assert!(row("a").editable);

		let kinds: Vec<_> = row("b").controls.iter().map(Control::kind).collect();
		assert_eq!(kinds, vec![EventKind::MarkReady, EventKind::Cancel]);
		assert!(row("b").editable);
		assert_eq!(row("b").style.background, "#fff3cd");

		assert!(row("c").controls.is_empty());
		assert!(!row("c").editable);

		assert_eq!(row("d").controls, vec![Control::Undo]);
		assert!(row("d").struck_through);
	}

	#[test]
	fn test_notify_only_for_newest_order_created_today() {
		let mut newest = order("b", "09:05:00", OrderState::Pending);
		newest.just_created = true;
		let snapshot = Snapshot::from_orders([order("a", "09:00:00", OrderState::Pending), newest]);
		let parts = partition(&snapshot, today());
		assert!(kitchen_view(&parts, Partition::Today, &staff(), today()).notify);

		let mut older = order("a", "09:00:00", OrderState::Pending);
		older.just_created = true;
		let snapshot = Snapshot::from_orders([older, order("b", "09:05:00", OrderState::Pending)]);
		let parts = partition(&snapshot, today());
		assert!(!kitchen_view(&parts, Partition::Today, &staff(), today()).notify);
	}

	#[test]
	fn test_previous_partition_never_notifies() {
		let mut yesterday = order("y", "23:59:00", OrderState::Pending);
		yesterday.date = today().pred_opt().unwrap();
		yesterday.just_created = true;
		let snapshot = Snapshot::from_orders([yesterday]);
		let parts = partition(&snapshot, today());

		let view = kitchen_view(&parts, Partition::Previous, &staff(), today());
		assert_eq!(view.rows.len(), 1);
		assert!(!view.notify);

		let empty = kitchen_view(&parts, Partition::Today, &staff(), today());
		assert!(empty.rows.is_empty());
		assert_eq!(empty.empty_message, Some(EMPTY_KITCHEN_MESSAGE));
	}

	#[test]
	fn test_dispatch_view_only_offers_courier_on_prepared() {
		let mut cooking = order("b", "09:05:00", OrderState::InPreparation);
		cooking.cook = Some("Luis".into());
		let mut shipped = order("c", "09:10:00", OrderState::Dispatched);
		shipped.cook = Some("Maria".into());
		let snapshot = Snapshot::from_orders([
			order("a", "09:00:00", OrderState::Prepared),
			cooking,
			shipped,
		]);
		let parts = partition(&snapshot, today());
		let view = dispatch_view(&parts, &staff());

		let ids: Vec<_> = view.rows.iter().map(|r| r.display_id).collect();
		assert_eq!(ids, vec![1, 2, 3]);

		assert!(view.rows[0].highlighted);
		assert_eq!(
			view.rows[0].control,
			Some(Control::AssignCourier {
				options: vec!["Carlos".into(), "Daniel".into()]
			})
		);
		assert_eq!(view.rows[1].cook.as_deref(), Some("Luis"));
		assert!(view.rows[1].control.is_none());
		assert!(view.rows[2].cook.is_none());
		assert!(!view.rows[2].highlighted);
	}

	#[test]
	fn test_dispatch_view_shows_only_today() {
		let mut yesterday = order("y", "18:00:00", OrderState::Prepared);
		yesterday.date = today().pred_opt().unwrap();
		let snapshot = Snapshot::from_orders([
			yesterday,
			order("b", "09:05:00", OrderState::Pending),
			order("a", "09:00:00", OrderState::Prepared),
		]);
		let parts = partition(&snapshot, today());
		let view = dispatch_view(&parts, &staff());

		let keys: Vec<_> = view.rows.iter().map(|r| r.key.as_str()).collect();
		assert_eq!(keys, vec!["a", "b"]);
		let ids: Vec<_> = view.rows.iter().map(|r| r.display_id).collect();
		assert_eq!(ids, vec![1, 2]);
		assert_eq!(view.rows.iter().filter(|r| r.highlighted).count(), 1);
		assert_eq!(view.rows.iter().filter(|r| r.control.is_some()).count(), 1);
		assert!(view.rows.iter().all(|r| r.date == today()));
	}

	#[test]
	fn test_edit_session() {
		let snapshot = Snapshot::from_orders([
			order("a", "09:00:00", OrderState::Pending),
			order("b", "09:05:00", OrderState::Prepared),
		]);
		let parts = partition(&snapshot, today());
		let view = kitchen_view(&parts, Partition::Today, &staff(), today());
		let row = |key: &str| view.rows.iter().find(|r| r.key == key).unwrap();

		assert!(EditSession::begin(row("b")).is_err());

		let mut session = EditSession::begin(row("a")).unwrap();
		session.set_text(" 3 tacos ");
		assert_eq!(session.text(), " 3 tacos ");
		let (key, patch) = session.save().unwrap().unwrap();
		assert_eq!(key, "a");
		assert_eq!(patch.item_text.as_deref(), Some("3 tacos"));

		let unchanged = EditSession::begin(row("a")).unwrap();
		assert_eq!(unchanged.save().unwrap(), None);

		let mut blank = EditSession::begin(row("a")).unwrap();
		blank.set_text("  ");
		assert_eq!(blank.save(), Err(LifecycleError::EmptyField("item_text")));
	}
}
