//! Passage renderer and macro runtime.
//!
//! # Role
//!
//! [`Runtime`] owns the document, variable state, macro registry, deferred
//! task queue, and optional persistent storage. Playing a passage runs its
//! text through the renderer, which dispatches each `<<macro>>` tag to its
//! handler with a [`MacroContext`].
//!
//! # Invariants
//!
//! - A failing macro renders one inline error view and rendering continues.
//! - Passages render detached and are attached to the container afterwards,
//!   so selector macros only see the previous document state.
//! - Deferred work runs only when a driver moves the task clock.

mod config;
mod context;
mod dispatch;
mod error;
mod error_view;
mod macros;
mod runtime;
mod story;
mod wikifier;

pub use config::{
	Config, DEFAULT_DOM_DELAY_MS, DEFAULT_MAX_LOOP_ITERATIONS, DEFAULT_MAX_NESTING, MacrosConfig, PassagesConfig, StorageConfig,
	load_config,
};
pub use context::{MacroContext, MacroDefinition, MacroFault, MacroHandler, MacroOutcome, MacroResult};
pub use error::{ConfigError, Result, RuntimeError, StoryError};
pub use error_view::{ERROR_CLASS, append_error, error_texts, strip_error_prolog, toggle_error_source};
pub use macros::{builtin_registry, register_builtins};
pub use runtime::{REMEMBER_KEY, Runtime};
pub use story::{Passage, Story, collapse_newlines};
pub use wikifier::RenderSummary;
