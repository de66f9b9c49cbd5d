//! Snapshot types delivered by the store subscription.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::Order;

/// The complete contents of a collection, keyed by store-assigned key.
pub type RawSnapshot = BTreeMap<String, Value>;

/// Shared handle to a raw snapshot. Every subscriber sees the same value.
pub type SharedSnapshot = Arc<RawSnapshot>;

/// A record that could not be decoded as an order.
#[derive(Debug, Clone)]
pub struct DecodeFailure {
	pub key: String,
	pub reason: String,
}

/// An immutable, decoded view of every order in the collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
	orders: BTreeMap<String, Order>,
}

impl Snapshot {
	/// Decodes a raw snapshot, setting aside records that are not valid orders.
	pub fn decode(raw: &RawSnapshot) -> (Self, Vec<DecodeFailure>) {
		let mut orders = BTreeMap::new();
		let mut failures = Vec::new();

		for (key, record) in raw {
			match Order::from_record(key, record.clone()) {
				Ok(order) => {
					orders.insert(key.clone(), order);
				},
				Err(e) => failures.push(DecodeFailure {
					key: key.clone(),
					reason: e.to_string(),
				}),
			}
		}

		(Self { orders }, failures)
	}

	pub fn from_orders(orders: impl IntoIterator<Item = Order>) -> Self {
		Self {
			orders: orders
				.into_iter()
				.map(|order| (order.key.clone(), order))
				.collect(),
		}
	}

	pub fn get(&self, key: &str) -> Option<&Order> {
		self.orders.get(key)
	}

	pub fn orders(&self) -> impl Iterator<Item = &Order> {
		self.orders.values()
	}

	pub fn len(&self) -> usize {
		self.orders.len()
	}

	pub fn is_empty(&self) -> bool {
		self.orders.is_empty()
	}
}
