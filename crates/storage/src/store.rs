use serde_json::Value as Json;

use crate::error::Result;

/// A namespaced key-value store.
///
/// Keys are non-empty strings. Empty keys are never present: `has` is
/// `false`, `get` is `None`, and `set`/`delete` report `false` without
/// touching the backing storage.
pub trait Store: Send {
	/// Backend name, e.g. `localStorage`.
	fn name(&self) -> &str;

	/// The storage id this store was created for.
	fn id(&self) -> &str;

	fn persistent(&self) -> bool;

	/// Number of keys in this store only, not in the whole backend.
	fn size(&self) -> usize {
		self.keys().len()
	}

	fn keys(&self) -> Vec<String>;

	fn has(&self, key: &str) -> bool;

	fn get(&self, key: &str) -> Option<Json>;

	fn set(&mut self, key: &str, value: &Json) -> Result<bool>;

	fn delete(&mut self, key: &str) -> Result<bool>;

	/// Removes every key of this store, leaving other stores in the backend alone.
	fn clear(&mut self) -> Result<bool>;
}

/// A pluggable persistence backend.
pub trait StorageAdapter: Send + Sync {
	fn name(&self) -> &str;

	/// Tests for support. Must have no lasting side effects when it returns `false`.
	fn init(&self, storage_id: &str, persistent: bool) -> bool;

	/// Builds a store. Only valid after a successful [`StorageAdapter::init`].
	fn create(&self, storage_id: &str, persistent: bool) -> Result<Box<dyn Store>>;
}
