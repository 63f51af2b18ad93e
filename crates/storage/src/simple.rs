use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, StoreError};
use crate::store::{StorageAdapter, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
	Unbound,
	/// Index of the adapter every later `create` goes to.
	Bound(usize),
	/// Every adapter failed to initialize.
	Exhausted,
}

/// Selects a storage adapter once and forwards every store creation to it.
///
/// The first `create` tries adapters in registration order and binds the
/// first one whose `init` succeeds. The binding never changes afterwards,
/// whatever storage id or persistence later calls ask for. If no adapter
/// initializes, that failure is remembered too.
pub struct SimpleStore {
	adapters: Vec<Arc<dyn StorageAdapter>>,
	binding: Mutex<Binding>,
}

impl Default for SimpleStore {
	fn default() -> Self {
		Self {
			adapters: Vec::new(),
			binding: Mutex::new(Binding::Unbound),
		}
	}
}

impl fmt::Debug for SimpleStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let names: Vec<&str> = self.adapters.iter().map(|a| a.name()).collect();
		f.debug_struct("SimpleStore")
			.field("adapters", &names)
			.field("binding", &*self.binding.lock())
			.finish()
	}
}

impl SimpleStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends an adapter to the selection order.
	pub fn with_adapter(mut self, adapter: impl StorageAdapter + 'static) -> Self {
		self.register(Arc::new(adapter));
		self
	}

	/// Appends an adapter to the selection order. Has no effect on an existing binding.
	pub fn register(&mut self, adapter: Arc<dyn StorageAdapter>) {
		tracing::trace!(adapter = adapter.name(), "storage.register");
		self.adapters.push(adapter);
	}

	/// Adapter names in selection order.
	pub fn adapters(&self) -> impl Iterator<Item = &str> {
		self.adapters.iter().map(|a| a.name())
	}

	/// Name of the bound adapter, if selection has happened and succeeded.
	pub fn bound(&self) -> Option<&str> {
		match *self.binding.lock() {
			Binding::Bound(index) => Some(self.adapters[index].name()),
			_ => None,
		}
	}

	/// Creates a store through the bound adapter, binding one first if needed.
	pub fn create(&self, storage_id: &str, persistent: bool) -> Result<Box<dyn Store>> {
		let index = {
			let mut binding = self.binding.lock();
			match *binding {
				Binding::Bound(index) => index,
				Binding::Exhausted => return Err(StoreError::NoAdapters),
				Binding::Unbound => {
					let Some(index) = self.adapters.iter().position(|a| a.init(storage_id, persistent)) else {
						tracing::warn!(adapters = self.adapters.len(), "storage.no_adapter");
						*binding = Binding::Exhausted;
						return Err(StoreError::NoAdapters);
					};
					tracing::debug!(adapter = self.adapters[index].name(), "storage.bound");
					*binding = Binding::Bound(index);
					index
				}
			}
		};
		self.adapters[index].create(storage_id, persistent)
	}
}
