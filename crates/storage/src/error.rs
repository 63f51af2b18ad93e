//! Error types for store selection and access.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while selecting an adapter or using a store.
#[derive(Debug, Error)]
pub enum StoreError {
	/// No registered adapter initialized. Remembered for the life of the selector.
	#[error("no valid storage adapters found")]
	NoAdapters,

	/// `create` was called on an adapter whose `init` never succeeded.
	#[error("adapter not initialized")]
	NotInitialized,

	/// The backing engine refused a write for lack of space.
	#[error("{name} quota exceeded")]
	QuotaExceeded {
		/// Engine name, e.g. `localStorage`.
		name: String,
	},

	/// The backing engine failed for a reason other than quota.
	#[error("{name} is unavailable: {message}")]
	Unavailable { name: String, message: String },

	/// Error reading or writing a store file.
	#[error("I/O error accessing {path}: {error}")]
	Io {
		path: PathBuf,
		error: std::io::Error,
	},

	/// A store file exists but does not hold a JSON object.
	#[error("malformed store file {path}: {error}")]
	Malformed {
		path: PathBuf,
		error: serde_json::Error,
	},

	/// A value could not be encoded for storage.
	#[error("cannot serialize value: {0}")]
	Serialize(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
