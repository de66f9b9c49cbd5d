//! Order store client for the board.
//!
//! The board keeps no state of its own: every order lives in a live key-value
//! collection that supports push-append, partial-field merge, and a
//! subscription that delivers the complete collection whenever any record
//! changes. This crate defines that contract and provides in-process
//! backends implementing it.

use async_trait::async_trait;
use board_types::{
	ImplementationRegistry, NewOrder, Order, OrderPatch, RawSnapshot, SharedSnapshot,
};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

mod hub;

pub use hub::SnapshotHub;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
	/// The key passed to a partial update does not exist in the collection.
	#[error("Record not found: {0}")]
	NotFound(String),
	/// A record or patch could not be converted to or from JSON.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// A record or patch was not a JSON object.
	#[error("Invalid record: {0}")]
	InvalidRecord(String),
	/// The backend failed to read or write.
	#[error("Backend error: {0}")]
	Backend(String),
	/// The backend configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Low-level interface implemented by every store backend.
///
/// Records are plain JSON objects. Every successful `create` or
/// `update_fields` must publish the complete new collection to the
/// collection's subscribers.
#[async_trait]
pub trait StoreInterface: Send + Sync {
	/// Appends a record and returns the key the store assigned to it.
	async fn create(&self, collection: &str, record: Value) -> Result<String, StoreError>;

	/// Merges `fields` into the record stored under `key`.
	///
	/// Fields not named in `fields` are left untouched. Concurrent writers
	/// resolve per field by last write wins.
	async fn update_fields(
		&self,
		collection: &str,
		key: &str,
		fields: Map<String, Value>,
	) -> Result<(), StoreError>;

	/// Returns the current contents of the collection.
	async fn snapshot(&self, collection: &str) -> Result<SharedSnapshot, StoreError>;

	/// Subscribes to snapshots published after this call.
	async fn subscribe(
		&self,
		collection: &str,
	) -> Result<broadcast::Receiver<SharedSnapshot>, StoreError>;
}

/// Type alias for store factory functions.
pub type StoreFactory = fn(&toml::Value) -> Result<Box<dyn StoreInterface>, StoreError>;

/// Registry trait for store implementations.
pub trait StoreRegistry: ImplementationRegistry<Factory = StoreFactory> {}

/// Get all registered store implementations as (name, factory) pairs.
pub fn get_all_implementations() -> Vec<(&'static str, StoreFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Stream of complete collection snapshots.
pub type SnapshotStream = BoxStream<'static, SharedSnapshot>;

/// Generates a new record key.
///
/// Keys are time-ordered, so records created later sort after earlier ones.
pub(crate) fn new_key() -> String {
	uuid::Uuid::now_v7().simple().to_string()
}

/// Merges `fields` into `record` in place.
pub(crate) fn merge_fields(record: &mut Value, fields: Map<String, Value>) -> Result<(), StoreError> {
	let target = record
		.as_object_mut()
		.ok_or_else(|| StoreError::InvalidRecord("stored record is not an object".into()))?;
	for (name, value) in fields {
		target.insert(name, value);
	}
	Ok(())
}

/// Typed front end over a [`StoreInterface`] backend.
///
/// The service speaks in orders and patches and turns the backend's
/// broadcast channel into the snapshot stream the board consumes.
pub struct StoreService {
	backend: Box<dyn StoreInterface>,
}

impl StoreService {
	pub fn new(backend: Box<dyn StoreInterface>) -> Self {
		Self { backend }
	}

	/// Subscribes to every snapshot of `collection`.
	///
	/// The stream yields the current snapshot first, then one snapshot per
	/// subsequent write. A subscriber that falls behind skips straight to the
	/// newest snapshot; since every snapshot is complete nothing is lost.
	pub async fn subscribe_all(&self, collection: &str) -> Result<SnapshotStream, StoreError> {
		// Subscribe before reading so no write can fall between the two.
		let receiver = self.backend.subscribe(collection).await?;
		let current = self.backend.snapshot(collection).await?;
		let collection = collection.to_string();

		let updates = BroadcastStream::new(receiver).filter_map(move |item| {
			let collection = collection.clone();
			async move {
				match item {
					Ok(snapshot) => Some(snapshot),
					Err(BroadcastStreamRecvError::Lagged(skipped)) => {
						tracing::debug!(
							collection = %collection,
							skipped,
							"Snapshot subscriber lagged, skipping to newest"
						);
						None
					},
				}
			}
		});

		Ok(stream::once(async move { current }).chain(updates).boxed())
	}

	/// Appends a new order and returns its key.
	pub async fn create_order(
		&self,
		collection: &str,
		order: NewOrder,
	) -> Result<String, StoreError> {
		let record = order
			.into_record()
			.map_err(|e| StoreError::Serialization(e.to_string()))?;
		self.backend.create(collection, record).await
	}

	/// Merges the fields named by `patch` into the order stored under `key`.
	pub async fn update_order(
		&self,
		collection: &str,
		key: &str,
		patch: &OrderPatch,
	) -> Result<(), StoreError> {
		let fields = patch
			.to_fields()
			.map_err(|e| StoreError::Serialization(e.to_string()))?;
		self.backend.update_fields(collection, key, fields).await
	}

	/// Reads the current raw contents of `collection`.
	pub async fn snapshot(&self, collection: &str) -> Result<RawSnapshot, StoreError> {
		Ok(self.backend.snapshot(collection).await?.as_ref().clone())
	}

	/// Reads the order stored under `key` as the store holds it right now.
	pub async fn order(&self, collection: &str, key: &str) -> Result<Option<Order>, StoreError> {
		let snapshot = self.backend.snapshot(collection).await?;
		snapshot
			.get(key)
			.map(|record| {
				Order::from_record(key, record.clone())
					.map_err(|e| StoreError::Serialization(e.to_string()))
			})
			.transpose()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use board_types::{OrderState, Snapshot, TimeOfDay};
	use chrono::NaiveDate;
	use implementations::memory::MemoryStore;
	use serde_json::json;

	fn new_order(customer: &str) -> NewOrder {
		NewOrder {
			customer: customer.into(),
			item_text: "2 tacos".into(),
			date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
			entry_time: TimeOfDay::from_hms(9, 0, 0).unwrap(),
		}
	}

	#[tokio::test]
	async fn test_subscribe_all_yields_current_then_updates() {
		let service = StoreService::new(Box::new(MemoryStore::new()));
		let first = service.create_order("orders", new_order("Ana")).await.unwrap();

		let mut stream = service.subscribe_all("orders").await.unwrap();
		let initial = stream.next().await.unwrap();
		assert_eq!(initial.len(), 1);
		assert!(initial.contains_key(&first));

		service.create_order("orders", new_order("Luis")).await.unwrap();
		let next = stream.next().await.unwrap();
		assert_eq!(next.len(), 2);
	}

	#[tokio::test]
	async fn test_update_order_merges_only_patch_fields() {
		let service = StoreService::new(Box::new(MemoryStore::new()));
		let key = service.create_order("orders", new_order("Ana")).await.unwrap();

		service
			.update_order("orders", &key, &OrderPatch::state(OrderState::Cancelled))
			.await
			.unwrap();

		let (snapshot, failures) = Snapshot::decode(&service.snapshot("orders").await.unwrap());
		assert!(failures.is_empty());
		let order = snapshot.get(&key).unwrap();
		assert_eq!(order.state, OrderState::Cancelled);
		assert_eq!(order.customer, "Ana");
		assert_eq!(order.item_text, "2 tacos");
		assert!(order.just_created);
	}

	#[tokio::test]
	async fn test_update_unknown_key_is_not_found() {
		let service = StoreService::new(Box::new(MemoryStore::new()));
		let result = service
			.update_order("orders", "missing", &OrderPatch::state(OrderState::Cancelled))
			.await;
		assert!(matches!(result, Err(StoreError::NotFound(k)) if k == "missing"));
	}

	#[tokio::test]
	async fn test_order_reads_latest_write() {
		let service = StoreService::new(Box::new(MemoryStore::new()));
		let key = service.create_order("orders", new_order("Ana")).await.unwrap();
		service
			.update_order("orders", &key, &OrderPatch::state(OrderState::Cancelled))
			.await
			.unwrap();

		let order = service.order("orders", &key).await.unwrap().unwrap();
		assert_eq!(order.key, key);
		assert_eq!(order.state, OrderState::Cancelled);
		assert!(service.order("orders", "missing").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_order_reports_undecodable_record() {
		let store = MemoryStore::new();
		let key = store.create("orders", json!({"customer": 7})).await.unwrap();
		let service = StoreService::new(Box::new(store));

		let result = service.order("orders", &key).await;
		assert!(matches!(result, Err(StoreError::Serialization(_))));
	}

	#[test]
	fn test_keys_are_time_ordered() {
		let first = new_key();
		std::thread::sleep(std::time::Duration::from_millis(2));
		let second = new_key();
		assert_ne!(first, second);
		assert!(first < second);
	}
}
