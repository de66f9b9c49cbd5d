//! Per-collection fan-out of snapshots to subscribers.

use board_types::SharedSnapshot;
use std::collections::HashMap;
use tokio::sync::{broadcast, Mutex};

/// Default number of snapshots buffered per subscriber before it lags.
pub const DEFAULT_SNAPSHOT_BUFFER: usize = 64;

/// Holds one broadcast channel per collection.
pub struct SnapshotHub {
	buffer: usize,
	channels: Mutex<HashMap<String, broadcast::Sender<SharedSnapshot>>>,
}

impl SnapshotHub {
	pub fn new(buffer: usize) -> Self {
		Self {
			buffer: buffer.max(1),
			channels: Mutex::new(HashMap::new()),
		}
	}

	pub async fn subscribe(&self, collection: &str) -> broadcast::Receiver<SharedSnapshot> {
		let mut channels = self.channels.lock().await;
		channels
			.entry(collection.to_string())
			.or_insert_with(|| broadcast::channel(self.buffer).0)
			.subscribe()
	}

	/// Publishes `snapshot` to every current subscriber of `collection`.
	///
	/// Returns the number of subscribers reached.
	pub async fn publish(&self, collection: &str, snapshot: SharedSnapshot) -> usize {
		let channels = self.channels.lock().await;
		match channels.get(collection) {
			// A send error only means nobody is listening right now.
			Some(sender) => sender.send(snapshot).unwrap_or(0),
			None => 0,
		}
	}
}

impl Default for SnapshotHub {
	fn default() -> Self {
		Self::new(DEFAULT_SNAPSHOT_BUFFER)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use board_types::RawSnapshot;
	use std::sync::Arc;

	#[tokio::test]
	async fn test_publish_reaches_only_matching_collection() {
		let hub = SnapshotHub::default();
		let mut orders = hub.subscribe("orders").await;
		let mut other = hub.subscribe("other").await;

		let reached = hub.publish("orders", Arc::new(RawSnapshot::new())).await;
		assert_eq!(reached, 1);
		assert!(orders.recv().await.unwrap().is_empty());
		assert!(other.try_recv().is_err());
	}

	#[tokio::test]
	async fn test_publish_without_subscribers() {
		let hub = SnapshotHub::default();
		assert_eq!(hub.publish("orders", Arc::new(RawSnapshot::new())).await, 0);
	}
}
