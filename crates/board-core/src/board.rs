//! The live order board.
//!
//! [`OrderBoard`] keeps the freshest decoded snapshot of the orders
//! collection, projects station views from it and turns station actions into
//! store writes. Every action is checked against the record the store holds
//! at that moment, and actions on one board run one at a time; a refused
//! action writes nothing.

use crate::clock::Clock;
use crate::event_bus::EventBus;
use crate::lifecycle::{self, LifecycleError};
use crate::partition::{self, Partition, Partitioned};
use crate::views::{self, DispatchView, EditSession, KitchenView};
use board_config::{Config, StaffConfig};
use board_store::{StoreError, StoreService};
use board_types::{
	BoardEvent, EventKind, Order, OrderState, RawSnapshot, Snapshot, TransitionEvent,
};
use chrono::NaiveDate;
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;

/// Capacity of the board event bus.
const EVENT_BUS_CAPACITY: usize = 256;

/// Errors returned by board actions.
#[derive(Debug, Error)]
pub enum BoardError {
	/// The action was refused; nothing was written.
	#[error(transparent)]
	Lifecycle(#[from] LifecycleError),
	/// The store failed to read or write.
	#[error("Store error: {0}")]
	Store(#[from] StoreError),
	#[error("Board stopped: {0}")]
	Stopped(String),
}

/// Tracks which order last triggered the new-order cue.
struct CueTracker {
	last: Option<String>,
}

impl CueTracker {
	/// Returns the key of today's newest order if it was just created and has
	/// not been cued before.
	fn next(&mut self, snapshot: &Snapshot, today: NaiveDate) -> Option<String> {
		let newest = newest_today(snapshot, today)?;
		if !newest.just_created || self.last.as_deref() == Some(newest.key.as_str()) {
			return None;
		}
		self.last = Some(newest.key.clone());
		self.last.clone()
	}
}

fn newest_today(snapshot: &Snapshot, today: NaiveDate) -> Option<&Order> {
	snapshot
		.orders()
		.filter(|order| order.date == today)
		.max_by(|a, b| {
			a.entry_time
				.cmp(&b.entry_time)
				.then_with(|| a.key.cmp(&b.key))
		})
}

/// Forwards store snapshots into the board.
struct SnapshotFeed {
	collection: String,
	latest: Arc<watch::Sender<Arc<Snapshot>>>,
	event_bus: EventBus,
	clock: Arc<dyn Clock>,
	cue: CueTracker,
}

impl SnapshotFeed {
	fn apply(&mut self, raw: &RawSnapshot, cue: bool) {
		let (snapshot, failures) = Snapshot::decode(raw);
		for failure in &failures {
			tracing::warn!(
				collection = %self.collection,
				order_key = %failure.key,
				reason = %failure.reason,
				"Skipping undecodable order record"
			);
		}

		let orders = snapshot.len();
		let cued = self.cue.next(&snapshot, self.clock.now().date);
		self.latest.send_replace(Arc::new(snapshot));
		tracing::debug!(collection = %self.collection, orders, "Snapshot applied");

		self.event_bus.publish(BoardEvent::SnapshotApplied { orders });
		if let Some(key) = cued.filter(|_| cue) {
			tracing::info!(order_key = %key, "New order for today");
			self.event_bus.publish(BoardEvent::NewOrderCue { key });
		}
	}
}

/// The order board shared by every station.
pub struct OrderBoard {
	config: Config,
	store: Arc<StoreService>,
	clock: Arc<dyn Clock>,
	event_bus: EventBus,
	latest_tx: Arc<watch::Sender<Arc<Snapshot>>>,
	latest: watch::Receiver<Arc<Snapshot>>,
	feed: Mutex<Option<JoinHandle<()>>>,
	/// Held from reading an order until its update is written.
	actions: Mutex<()>,
}

impl OrderBoard {
	pub fn new(config: Config, store: Arc<StoreService>, clock: Arc<dyn Clock>) -> Self {
		let (latest_tx, latest) = watch::channel(Arc::new(Snapshot::default()));
		Self {
			config,
			store,
			clock,
			event_bus: EventBus::new(EVENT_BUS_CAPACITY),
			latest_tx: Arc::new(latest_tx),
			latest,
			feed: Mutex::new(None),
			actions: Mutex::new(()),
		}
	}

	fn collection(&self) -> &str {
		&self.config.board.collection
	}

	/// Subscribes to the store and starts forwarding snapshots.
	///
	/// Returns once the current snapshot has been applied. Calling `start` on a
	/// running board does nothing.
	pub async fn start(&self) -> Result<(), BoardError> {
		let mut feed_handle = self.feed.lock().await;
		if feed_handle.is_some() {
			return Ok(());
		}

		let mut stream = self.store.subscribe_all(self.collection()).await?;
		let mut feed = SnapshotFeed {
			collection: self.collection().to_string(),
			latest: self.latest_tx.clone(),
			event_bus: self.event_bus.clone(),
			clock: self.clock.clone(),
			cue: CueTracker { last: None },
		};

		// Orders already on the board when it starts are not announced.
		if let Some(current) = stream.next().await {
			feed.apply(&current, false);
		}

		let collection = self.collection().to_string();
		*feed_handle = Some(tokio::spawn(async move {
			while let Some(raw) = stream.next().await {
				feed.apply(&raw, true);
			}
			tracing::warn!(collection = %collection, "Snapshot subscription ended");
		}));

		tracing::info!(
			board = %self.config.board.id,
			collection = %self.collection(),
			orders = self.latest.borrow().len(),
			"Board started"
		);
		Ok(())
	}

	/// Stops forwarding snapshots.
	pub async fn shutdown(&self) {
		if let Some(handle) = self.feed.lock().await.take() {
			handle.abort();
			tracing::info!(board = %self.config.board.id, "Board stopped");
		}
	}

	/// The freshest snapshot the board holds.
	pub fn snapshot(&self) -> Arc<Snapshot> {
		self.latest.borrow().clone()
	}

	/// Waits until a snapshot satisfying `predicate` has been applied.
	pub async fn wait_for(
		&self,
		mut predicate: impl FnMut(&Snapshot) -> bool,
	) -> Result<Arc<Snapshot>, BoardError> {
		let mut receiver = self.latest.clone();
		let snapshot = receiver
			.wait_for(|snapshot| predicate(&**snapshot))
			.await
			.map_err(|e| BoardError::Stopped(e.to_string()))?;
		Ok(snapshot.clone())
	}

	pub fn subscribe_events(&self) -> broadcast::Receiver<BoardEvent> {
		self.event_bus.subscribe()
	}

	pub fn today(&self) -> NaiveDate {
		self.clock.now().date
	}

	pub fn staff(&self) -> &StaffConfig {
		&self.config.staff
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// The current snapshot split around today.
	pub fn partitioned(&self) -> Partitioned {
		partition::partition(&self.snapshot(), self.today())
	}

	pub fn kitchen_view(&self, partition: Partition) -> KitchenView {
		views::kitchen_view(
			&self.partitioned(),
			partition,
			&self.config.staff,
			self.today(),
		)
	}

	pub fn dispatch_view(&self) -> DispatchView {
		views::dispatch_view(&self.partitioned(), &self.config.staff)
	}

	fn reject(&self, key: Option<&str>, event: Option<EventKind>, error: BoardError) -> BoardError {
		tracing::warn!(
			order_key = key.unwrap_or("-"),
			event = %event.map(|e| e.to_string()).unwrap_or_default(),
			error = %error,
			"Action rejected"
		);
		self.event_bus
			.publish(BoardEvent::rejected(key, event, &error));
		error
	}

	async fn current(&self, key: &str) -> Result<Order, BoardError> {
		self.store
			.order(self.collection(), key)
			.await?
			.ok_or_else(|| LifecycleError::OrderNotFound(key.to_string()).into())
	}

	/// Appends a new order stamped with the current day and time.
	pub async fn submit_order(&self, customer: &str, item_text: &str) -> Result<String, BoardError> {
		let new_order = lifecycle::plan_intake(customer, item_text, self.clock.now())
			.map_err(|e| self.reject(None, None, e.into()))?;

		let key = self
			.store
			.create_order(self.collection(), new_order)
			.await
			.map_err(|e| self.reject(None, None, e.into()))?;

		tracing::info!(order_key = %key, state = %OrderState::Pending, "Order created");
		self.event_bus
			.publish(BoardEvent::OrderCreated { key: key.clone() });
		Ok(key)
	}

	/// Applies a lifecycle event to the order stored under `key` and returns
	/// the state it moved to.
	pub async fn apply(&self, key: &str, event: TransitionEvent) -> Result<OrderState, BoardError> {
		let kind = event.kind();
		let _guard = self.actions.lock().await;
		let order = self
			.current(key)
			.await
			.map_err(|e| self.reject(Some(key), Some(kind), e))?;
		let patch = lifecycle::plan_transition(&order, &event, self.clock.now().time)
			.map_err(|e| self.reject(Some(key), Some(kind), e.into()))?;
		let to = patch.state.unwrap_or(order.state);

		self.store
			.update_order(self.collection(), key, &patch)
			.await
			.map_err(|e| self.reject(Some(key), Some(kind), e.into()))?;

		tracing::info!(
			order_key = %key,
			event = %kind,
			from = %order.state,
			state = %to,
			"Order transitioned"
		);
		self.event_bus.publish(BoardEvent::OrderTransitioned {
			key: key.to_string(),
			from: order.state,
			to,
		});
		Ok(to)
	}

	/// Replaces the item text of the order stored under `key`.
	pub async fn edit_item(&self, key: &str, item_text: &str) -> Result<(), BoardError> {
		let _guard = self.actions.lock().await;
		let order = self
			.current(key)
			.await
			.map_err(|e| self.reject(Some(key), None, e))?;
		let patch = lifecycle::plan_item_edit(&order, item_text)
			.map_err(|e| self.reject(Some(key), None, e.into()))?;

		self.store
			.update_order(self.collection(), key, &patch)
			.await
			.map_err(|e| self.reject(Some(key), None, e.into()))?;

		tracing::info!(order_key = %key, state = %order.state, "Item text edited");
		self.event_bus.publish(BoardEvent::ItemEdited {
			key: key.to_string(),
		});
		Ok(())
	}

	/// Writes a finished edit session. Returns `false` if the text was
	/// unchanged and nothing was written.
	pub async fn save_edit(&self, session: EditSession) -> Result<bool, BoardError> {
		let key = session.key().to_string();
		match session
			.save()
			.map_err(|e| self.reject(Some(&key), None, e.into()))?
		{
			Some((key, patch)) => {
				let text = patch.item_text.unwrap_or_default();
				self.edit_item(&key, &text).await?;
				Ok(true)
			},
			None => Ok(false),
		}
	}
}
