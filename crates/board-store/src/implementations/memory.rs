//! In-memory store backend.
//!
//! Keeps every collection in a map behind a read-write lock. Useful for tests
//! and for single-process boards where losing orders on restart is acceptable.

use crate::hub::DEFAULT_SNAPSHOT_BUFFER;
use crate::{merge_fields, new_key, SnapshotHub, StoreError, StoreFactory, StoreInterface};
use async_trait::async_trait;
use board_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, RawSnapshot, Schema, SharedSnapshot,
	ValidationError,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// In-memory store implementation.
pub struct MemoryStore {
	collections: RwLock<HashMap<String, RawSnapshot>>,
	hub: SnapshotHub,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::with_buffer(DEFAULT_SNAPSHOT_BUFFER)
	}

	pub fn with_buffer(buffer: usize) -> Self {
		Self {
			collections: RwLock::new(HashMap::new()),
			hub: SnapshotHub::new(buffer),
		}
	}
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StoreInterface for MemoryStore {
	async fn create(&self, collection: &str, record: Value) -> Result<String, StoreError> {
		if !record.is_object() {
			return Err(StoreError::InvalidRecord("record must be an object".into()));
		}

		let key = new_key();
		// Published under the lock: subscribers see snapshots in write order.
		{
			let mut collections = self.collections.write().await;
			let records = collections.entry(collection.to_string()).or_default();
			records.insert(key.clone(), record);
			self.hub.publish(collection, Arc::new(records.clone())).await;
		}

		Ok(key)
	}

	async fn update_fields(
		&self,
		collection: &str,
		key: &str,
		fields: Map<String, Value>,
	) -> Result<(), StoreError> {
		{
			let mut collections = self.collections.write().await;
			let records = collections
				.get_mut(collection)
				.ok_or_else(|| StoreError::NotFound(key.to_string()))?;
			let record = records
				.get_mut(key)
				.ok_or_else(|| StoreError::NotFound(key.to_string()))?;
			merge_fields(record, fields)?;
			self.hub.publish(collection, Arc::new(records.clone())).await;
		}

		Ok(())
	}

	async fn snapshot(&self, collection: &str) -> Result<SharedSnapshot, StoreError> {
		let collections = self.collections.read().await;
		Ok(Arc::new(
			collections.get(collection).cloned().unwrap_or_default(),
		))
	}

	async fn subscribe(
		&self,
		collection: &str,
	) -> Result<broadcast::Receiver<SharedSnapshot>, StoreError> {
		Ok(self.hub.subscribe(collection).await)
	}
}

/// Configuration schema for MemoryStore.
pub struct MemoryStoreSchema;

impl ConfigSchema for MemoryStoreSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new(
				"snapshot_buffer",
				FieldType::Integer {
					min: Some(1),
					max: Some(65_536),
				},
			)],
		);
		schema.validate(config)
	}
}

/// Factory function to create a memory store from configuration.
///
/// Configuration parameters:
/// - `snapshot_buffer`: snapshots buffered per subscriber (default: 64)
pub fn create_store(config: &toml::Value) -> Result<Box<dyn StoreInterface>, StoreError> {
	MemoryStoreSchema
		.validate(config)
		.map_err(|e| StoreError::Configuration(e.to_string()))?;

	let buffer = config
		.get("snapshot_buffer")
		.and_then(|v| v.as_integer())
		.map(|v| v as usize)
		.unwrap_or(DEFAULT_SNAPSHOT_BUFFER);

	Ok(Box::new(MemoryStore::with_buffer(buffer)))
}

/// Registry for the memory store implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StoreFactory;

	fn factory() -> Self::Factory {
		create_store
	}
}

impl crate::StoreRegistry for Registry {}
