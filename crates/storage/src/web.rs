//! Web-storage style adapter over string key-value engines.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value as Json;

use crate::error::{Result, StoreError};
use crate::store::{StorageAdapter, Store};

/// Why an engine refused an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
	QuotaExceeded,
	Unavailable(String),
}

/// A flat string-to-string storage area shared by every store using it,
/// in the manner of `localStorage` and `sessionStorage`.
pub trait StorageEngine: Send + Sync {
	fn name(&self) -> &str;

	/// Number of items across every prefix.
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn keys(&self) -> Vec<String>;

	fn get_item(&self, key: &str) -> Option<String>;

	fn set_item(&self, key: &str, value: &str) -> std::result::Result<(), EngineError>;

	fn remove_item(&self, key: &str);
}

/// In-process engine with an optional byte quota over keys plus values.
#[derive(Debug)]
pub struct MemoryEngine {
	name: String,
	quota: Option<usize>,
	items: Mutex<IndexMap<String, String>>,
}

impl MemoryEngine {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			quota: None,
			items: Mutex::new(IndexMap::new()),
		}
	}

	pub fn with_quota(mut self, bytes: usize) -> Self {
		self.quota = Some(bytes);
		self
	}
}

impl StorageEngine for MemoryEngine {
	fn name(&self) -> &str {
		&self.name
	}

	fn len(&self) -> usize {
		self.items.lock().len()
	}

	fn keys(&self) -> Vec<String> {
		self.items.lock().keys().cloned().collect()
	}

	fn get_item(&self, key: &str) -> Option<String> {
		self.items.lock().get(key).cloned()
	}

	fn set_item(&self, key: &str, value: &str) -> std::result::Result<(), EngineError> {
		let mut items = self.items.lock();
		if let Some(quota) = self.quota {
			let used: usize = items.iter().filter(|(k, _)| k.as_str() != key).map(|(k, v)| k.len() + v.len()).sum();
			if used + key.len() + value.len() > quota {
				return Err(EngineError::QuotaExceeded);
			}
		}
		items.insert(key.to_owned(), value.to_owned());
		Ok(())
	}

	fn remove_item(&self, key: &str) {
		self.items.lock().shift_remove(key);
	}
}

/// Adapter over a persistent ("local") and a per-session engine.
pub struct WebStorageAdapter {
	local: Arc<dyn StorageEngine>,
	session: Arc<dyn StorageEngine>,
	ok: AtomicBool,
}

impl WebStorageAdapter {
	pub fn new(local: Arc<dyn StorageEngine>, session: Arc<dyn StorageEngine>) -> Self {
		Self {
			local,
			session,
			ok: AtomicBool::new(false),
		}
	}

	/// Both engines in memory, named like their browser counterparts.
	pub fn in_memory() -> Self {
		Self::new(Arc::new(MemoryEngine::new("localStorage")), Arc::new(MemoryEngine::new("sessionStorage")))
	}
}

/// Feature test: write, read back and remove a scratch key. A quota failure on
/// an engine that already holds data still counts as working.
fn writable(engine: &dyn StorageEngine) -> bool {
	static SCRATCH_KEYS: AtomicU64 = AtomicU64::new(0);
	let key = format!("_qs_{}", SCRATCH_KEYS.fetch_add(1, Ordering::Relaxed));
	match engine.set_item(&key, &key) {
		Ok(()) => {
			let ok = engine.get_item(&key).as_deref() == Some(key.as_str());
			engine.remove_item(&key);
			ok
		}
		Err(EngineError::QuotaExceeded) => !engine.is_empty(),
		Err(EngineError::Unavailable(_)) => false,
	}
}

impl StorageAdapter for WebStorageAdapter {
	fn name(&self) -> &str {
		"webstorage"
	}

	fn init(&self, _storage_id: &str, _persistent: bool) -> bool {
		let ok = writable(self.local.as_ref()) && writable(self.session.as_ref());
		self.ok.store(ok, Ordering::Release);
		ok
	}

	fn create(&self, storage_id: &str, persistent: bool) -> Result<Box<dyn Store>> {
		if !self.ok.load(Ordering::Acquire) {
			return Err(StoreError::NotInitialized);
		}
		let engine = if persistent { &self.local } else { &self.session };
		Ok(Box::new(WebStore {
			engine: Arc::clone(engine),
			prefix: format!("{storage_id}."),
			id: storage_id.to_owned(),
			persistent,
		}))
	}
}

/// A store occupying the `<id>.` prefix of an engine.
struct WebStore {
	engine: Arc<dyn StorageEngine>,
	prefix: String,
	id: String,
	persistent: bool,
}

impl WebStore {
	fn full_key(&self, key: &str) -> String {
		format!("{}{key}", self.prefix)
	}
}

impl Store for WebStore {
	fn name(&self) -> &str {
		self.engine.name()
	}

	fn id(&self) -> &str {
		&self.id
	}

	fn persistent(&self) -> bool {
		self.persistent
	}

	fn keys(&self) -> Vec<String> {
		self.engine
			.keys()
			.into_iter()
			.filter_map(|key| key.strip_prefix(&self.prefix).map(str::to_owned))
			.collect()
	}

	fn has(&self, key: &str) -> bool {
		!key.is_empty() && self.engine.get_item(&self.full_key(key)).is_some()
	}

	fn get(&self, key: &str) -> Option<Json> {
		if key.is_empty() {
			return None;
		}
		let raw = self.engine.get_item(&self.full_key(key))?;
		match serde_json::from_str(&raw) {
			Ok(value) => Some(value),
			Err(error) => {
				tracing::warn!(key, %error, "storage.corrupt_value");
				None
			}
		}
	}

	fn set(&mut self, key: &str, value: &Json) -> Result<bool> {
		if key.is_empty() {
			return Ok(false);
		}
		let encoded = serde_json::to_string(value)?;
		self.engine.set_item(&self.full_key(key), &encoded).map_err(|error| match error {
			EngineError::QuotaExceeded => StoreError::QuotaExceeded {
				name: self.engine.name().to_owned(),
			},
			EngineError::Unavailable(message) => StoreError::Unavailable {
				name: self.engine.name().to_owned(),
				message,
			},
		})?;
		Ok(true)
	}

	fn delete(&mut self, key: &str) -> Result<bool> {
		if key.is_empty() {
			return Ok(false);
		}
		self.engine.remove_item(&self.full_key(key));
		Ok(true)
	}

	fn clear(&mut self) -> Result<bool> {
		for key in self.keys() {
			self.delete(&key)?;
		}
		Ok(true)
	}
}
