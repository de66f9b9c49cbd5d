//! File-backed store backend.
//!
//! Each collection is a single JSON document under the configured directory.
//! Every write takes an advisory lock on the directory, re-reads the document,
//! applies the change and renames a temporary file over it, so several board
//! processes may share a directory without losing each other's writes.
//! Snapshots and subscriptions reflect what this process last read or wrote;
//! writes made by another process show up here on the next local write.

use crate::hub::DEFAULT_SNAPSHOT_BUFFER;
use crate::{merge_fields, new_key, SnapshotHub, StoreError, StoreFactory, StoreInterface};
use async_trait::async_trait;
use board_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, RawSnapshot, Schema, SharedSnapshot,
	ValidationError,
};
use fs2::FileExt;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

const LOCK_FILE: &str = ".board.lock";

/// File-backed store implementation.
pub struct FileStore {
	base_path: PathBuf,
	collections: Mutex<HashMap<String, RawSnapshot>>,
	hub: SnapshotHub,
}

impl FileStore {
	pub fn new(base_path: PathBuf, buffer: usize) -> Self {
		Self {
			base_path,
			collections: Mutex::new(HashMap::new()),
			hub: SnapshotHub::new(buffer),
		}
	}

	/// Maps a collection name to its document path.
	fn document_path(&self, collection: &str) -> PathBuf {
		let safe_name = collection.replace(['/', '\\', ':'], "_");
		self.base_path.join(format!("{}.json", safe_name))
	}

	/// Returns the cached records of a collection, loading them on first use.
	async fn records<'a>(
		&self,
		collections: &'a mut HashMap<String, RawSnapshot>,
		collection: &str,
	) -> Result<&'a mut RawSnapshot, StoreError> {
		if !collections.contains_key(collection) {
			let path = self.document_path(collection);
			let loaded = tokio::task::spawn_blocking(move || read_document(&path))
				.await
				.map_err(|e| StoreError::Backend(e.to_string()))??;
			tracing::debug!(collection, records = loaded.len(), "Loaded collection");
			collections.insert(collection.to_string(), loaded);
		}
		collections
			.get_mut(collection)
			.ok_or_else(|| StoreError::Backend(format!("collection {} not loaded", collection)))
	}

	/// Applies `change` to the on-disk document under the directory lock and
	/// returns the records that were written.
	async fn write_through<T, F>(
		&self,
		collection: &str,
		change: F,
	) -> Result<(RawSnapshot, T), StoreError>
	where
		F: FnOnce(&mut RawSnapshot) -> Result<T, StoreError> + Send + 'static,
		T: Send + 'static,
	{
		let base_path = self.base_path.clone();
		let path = self.document_path(collection);

		tokio::task::spawn_blocking(move || write_locked(&base_path, &path, change))
			.await
			.map_err(|e| StoreError::Backend(e.to_string()))?
	}

	/// Stores the written records locally and publishes them.
	async fn commit(
		&self,
		collections: &mut HashMap<String, RawSnapshot>,
		collection: &str,
		records: RawSnapshot,
	) {
		let snapshot = Arc::new(records.clone());
		collections.insert(collection.to_string(), records);
		self.hub.publish(collection, snapshot).await;
	}
}

fn backend(e: std::io::Error) -> StoreError {
	StoreError::Backend(e.to_string())
}

/// Reads a collection document, treating a missing file as an empty collection.
fn read_document(path: &Path) -> Result<RawSnapshot, StoreError> {
	let data = match std::fs::read(path) {
		Ok(data) => data,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RawSnapshot::new()),
		Err(e) => return Err(backend(e)),
	};
	serde_json::from_slice(&data).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Re-reads, changes and rewrites the document at `path` while holding the
/// directory lock. Nothing is written if `change` fails.
fn write_locked<T>(
	base_path: &Path,
	path: &Path,
	change: impl FnOnce(&mut RawSnapshot) -> Result<T, StoreError>,
) -> Result<(RawSnapshot, T), StoreError> {
	std::fs::create_dir_all(base_path).map_err(backend)?;
	let lock = OpenOptions::new()
		.create(true)
		.truncate(false)
		.write(true)
		.open(base_path.join(LOCK_FILE))
		.map_err(backend)?;
	lock.lock_exclusive().map_err(backend)?;

	let result: Result<(RawSnapshot, T), StoreError> = (|| {
		let mut records = read_document(path)?;
		let output = change(&mut records)?;
		let bytes = serde_json::to_vec_pretty(&records)
			.map_err(|e| StoreError::Serialization(e.to_string()))?;

		let temp_path = path.with_extension("tmp");
		let mut temp = std::fs::File::create(&temp_path).map_err(backend)?;
		temp.write_all(&bytes).map_err(backend)?;
		temp.sync_all().map_err(backend)?;
		std::fs::rename(&temp_path, path).map_err(backend)?;
		Ok((records, output))
	})();

	if let Err(e) = lock.unlock() {
		tracing::warn!("Failed to release store lock: {}", e);
	}
	result
}

#[async_trait]
impl StoreInterface for FileStore {
	async fn create(&self, collection: &str, record: Value) -> Result<String, StoreError> {
		if !record.is_object() {
			return Err(StoreError::InvalidRecord("record must be an object".into()));
		}

		let key = new_key();
		let inserted = key.clone();
		// Held across the write: subscribers see snapshots in write order.
		let mut collections = self.collections.lock().await;
		let (records, ()) = self
			.write_through(collection, move |records| {
				records.insert(inserted, record);
				Ok(())
			})
			.await?;
		self.commit(&mut collections, collection, records).await;
		Ok(key)
	}

	async fn update_fields(
		&self,
		collection: &str,
		key: &str,
		fields: Map<String, Value>,
	) -> Result<(), StoreError> {
		let target = key.to_string();
		let mut collections = self.collections.lock().await;
		let (records, ()) = self
			.write_through(collection, move |records| {
				let record = records
					.get_mut(&target)
					.ok_or_else(|| StoreError::NotFound(target.clone()))?;
				merge_fields(record, fields)
			})
			.await?;
		self.commit(&mut collections, collection, records).await;
		Ok(())
	}

	async fn snapshot(&self, collection: &str) -> Result<SharedSnapshot, StoreError> {
		let mut collections = self.collections.lock().await;
		let records = self.records(&mut collections, collection).await?;
		Ok(Arc::new(records.clone()))
	}

	async fn subscribe(
		&self,
		collection: &str,
	) -> Result<broadcast::Receiver<SharedSnapshot>, StoreError> {
		Ok(self.hub.subscribe(collection).await)
	}
}

/// Configuration schema for FileStore.
pub struct FileStoreSchema;

impl ConfigSchema for FileStoreSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("storage_path", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(path) if path.trim().is_empty() => {
							Err("storage_path cannot be blank".to_string())
						},
						_ => Ok(()),
					}
				}),
				Field::new(
					"snapshot_buffer",
					FieldType::Integer {
						min: Some(1),
						max: Some(65_536),
					},
				),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file store from configuration.
///
/// Configuration parameters:
/// - `storage_path`: directory holding the collection documents (default: "./data/board")
/// - `snapshot_buffer`: snapshots buffered per subscriber (default: 64)
pub fn create_store(config: &toml::Value) -> Result<Box<dyn StoreInterface>, StoreError> {
	FileStoreSchema
		.validate(config)
		.map_err(|e| StoreError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/board");
	let buffer = config
		.get("snapshot_buffer")
		.and_then(|v| v.as_integer())
		.map(|v| v as usize)
		.unwrap_or(DEFAULT_SNAPSHOT_BUFFER);

	Ok(Box::new(FileStore::new(PathBuf::from(storage_path), buffer)))
}

/// Registry for the file store implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StoreFactory;

	fn factory() -> Self::Factory {
		create_store
	}
}

impl crate::StoreRegistry for Registry {}
