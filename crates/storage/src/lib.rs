//! Simple key-value storage with pluggable adapters.
//!
//! # Role
//!
//! [`SimpleStore`] owns an ordered list of [`StorageAdapter`]s. The first
//! store request tries them in order and binds the first that initializes;
//! every later request goes straight to that adapter. Two adapters ship
//! here: [`WebStorageAdapter`] over flat string engines with prefixed keys,
//! and [`FileAdapter`] writing one JSON document per storage id.
//!
//! # Invariants
//!
//! - The adapter binding is made at most once per [`SimpleStore`].
//! - A failed selection is final; later requests fail without probing.
//! - A store only sees keys under its own id.

mod error;
mod file;
mod simple;
mod store;
mod web;

#[cfg(test)]
mod tests;

pub use error::{Result, StoreError};
pub use file::FileAdapter;
pub use simple::SimpleStore;
pub use store::{StorageAdapter, Store};
pub use web::{EngineError, MemoryEngine, StorageEngine, WebStorageAdapter};
