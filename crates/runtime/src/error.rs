//! Error types for configuration, story loading, and the runtime.

use std::path::PathBuf;

use quire_registry::RegistryError;
use quire_storage::StoreError;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The file is not valid configuration TOML.
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),
}

/// Errors that can occur when loading a story.
#[derive(Debug, Error)]
pub enum StoryError {
	#[error("I/O error reading {path}: {error}")]
	Io { path: PathBuf, error: std::io::Error },

	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("duplicate passage \"{0}\"")]
	Duplicate(String),

	#[error("passage name must not be empty")]
	EmptyName,
}

/// Errors surfaced by [`crate::Runtime`] outside of macro rendering.
#[derive(Debug, Error)]
pub enum RuntimeError {
	#[error("passage \"{0}\" does not exist")]
	UnknownPassage(String),

	#[error(transparent)]
	Registry(#[from] RegistryError),

	#[error(transparent)]
	Store(#[from] StoreError),
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
