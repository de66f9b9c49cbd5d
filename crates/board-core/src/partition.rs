//! Day partitioning and display numbering.
//!
//! Orders are bucketed by the calendar day they were entered on. Inside a
//! bucket they are ranked by entry time and numbered from 1. The bucket whose
//! day equals the current wall-clock date is "today"; every other bucket is
//! "previous". Numbers are recomputed on every read and never stored.

use board_types::{Order, Snapshot};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which side of the day split a view shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
	#[default]
	Today,
	Previous,
}

/// An order together with its rank inside its day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberedOrder {
	pub display_id: usize,
	#[serde(flatten)]
	pub order: Order,
	pub key: String,
}

/// Orders split into today and previous days, each numbered in ascending
/// display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitioned {
	pub today: Vec<NumberedOrder>,
	/// Previous buckets, oldest day first.
	pub previous: Vec<NumberedOrder>,
}

impl Partitioned {
	pub fn get(&self, partition: Partition) -> &[NumberedOrder] {
		match partition {
			Partition::Today => &self.today,
			Partition::Previous => &self.previous,
		}
	}
}

/// Buckets orders by entry date.
pub fn group_by_date<'a>(
	orders: impl IntoIterator<Item = &'a Order>,
) -> BTreeMap<NaiveDate, Vec<&'a Order>> {
	let mut buckets: BTreeMap<NaiveDate, Vec<&Order>> = BTreeMap::new();
	for order in orders {
		buckets.entry(order.date).or_default().push(order);
	}
	buckets
}

/// Ranks a single bucket by entry time, breaking ties on the store key.
pub fn number_bucket(mut bucket: Vec<&Order>) -> Vec<NumberedOrder> {
	bucket.sort_by(|a, b| {
		a.entry_time
			.cmp(&b.entry_time)
			.then_with(|| a.key.cmp(&b.key))
	});
	bucket
		.into_iter()
		.enumerate()
		.map(|(i, order)| NumberedOrder {
			display_id: i + 1,
			key: order.key.clone(),
			order: order.clone(),
		})
		.collect()
}

/// Splits `snapshot` around `today`.
pub fn partition(snapshot: &Snapshot, today: NaiveDate) -> Partitioned {
	let mut result = Partitioned::default();
	for (date, bucket) in group_by_date(snapshot.orders()) {
		let numbered = number_bucket(bucket);
		if date == today {
			result.today = numbered;
		} else {
			result.previous.extend(numbered);
		}
	}
	result
}
