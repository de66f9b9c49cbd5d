//! Broadcast bus for board events.

use board_types::BoardEvent;
use tokio::sync::broadcast;

/// Fans board events out to every subscriber.
///
/// Publishing never blocks and never fails: with no subscribers the event is
/// simply dropped, and slow subscribers observe a lag error on their side.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<BoardEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity.max(1));
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
		self.sender.subscribe()
	}

	/// Publishes `event`, returning how many subscribers received it.
	pub fn publish(&self, event: BoardEvent) -> usize {
		self.sender.send(event).unwrap_or(0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_publish_and_subscribe() {
		let bus = EventBus::new(8);
		assert_eq!(bus.publish(BoardEvent::SnapshotApplied { orders: 0 }), 0);

		let mut receiver = bus.subscribe();
		let event = BoardEvent::OrderCreated { key: "k1".into() };
		assert_eq!(bus.publish(event.clone()), 1);
		assert_eq!(receiver.recv().await.unwrap(), event);
	}
}
