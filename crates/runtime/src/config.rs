//! Runtime configuration.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! debug = false
//! dom_delay_ms = 40
//! max_nesting = 100
//!
//! [macros]
//! if_assignment_error = true
//! max_loop_iterations = 1000
//!
//! [passages]
//! nobr = false
//! start = "Start"
//!
//! [storage]
//! id = "quire"
//! dir = "saves"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Delay before deferred macro work runs, in milliseconds.
pub const DEFAULT_DOM_DELAY_MS: u64 = 40;

/// Default cap on nested macro invocations.
pub const DEFAULT_MAX_NESTING: usize = 100;

/// Default cap on iterations of a single `<<for>>`.
pub const DEFAULT_MAX_LOOP_ITERATIONS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Wraps macro output in debug views.
	pub debug: bool,
	/// Delay shared by every deferred and cosmetic task.
	pub dom_delay_ms: u64,
	/// Maximum depth of nested macro invocations before rendering faults.
	pub max_nesting: usize,
	pub macros: MacrosConfig,
	pub passages: PassagesConfig,
	pub storage: StorageConfig,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			debug: false,
			dom_delay_ms: DEFAULT_DOM_DELAY_MS,
			max_nesting: DEFAULT_MAX_NESTING,
			macros: MacrosConfig::default(),
			passages: PassagesConfig::default(),
			storage: StorageConfig::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MacrosConfig {
	/// Rejects `<<if>>` and `<<elseif>>` conditions containing a lone `=`.
	pub if_assignment_error: bool,
	/// Iterations after which a `<<for>>` gives up with an error.
	pub max_loop_iterations: u64,
}

impl Default for MacrosConfig {
	fn default() -> Self {
		Self {
			if_assignment_error: true,
			max_loop_iterations: DEFAULT_MAX_LOOP_ITERATIONS,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PassagesConfig {
	/// Collapses newlines in every passage, as if each were tagged `nobr`.
	pub nobr: bool,
	/// Passage played first.
	pub start: String,
}

impl Default for PassagesConfig {
	fn default() -> Self {
		Self {
			nobr: false,
			start: "Start".to_owned(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
	/// Storage id handed to the adapter selector.
	pub id: String,
	/// Directory for the file adapter. Without one only web-style storage is tried.
	pub dir: Option<PathBuf>,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			id: "quire".to_owned(),
			dir: None,
		}
	}
}

impl Config {
	/// Parses configuration TOML.
	pub fn parse(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	/// Loads configuration from a file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		Self::parse(&content)
	}
}

/// Loads configuration from a file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
	Config::load(path)
}
