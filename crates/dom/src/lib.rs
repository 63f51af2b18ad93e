//! Minimal document model that macro handlers render into.
//!
//! # Role
//!
//! Nodes live in a single arena owned by [`Document`] and are addressed by
//! [`NodeId`]. Detached nodes stay in the arena until they are discarded;
//! removing or emptying frees the affected subtrees, and their slots are
//! reused by later allocations.
//!
//! # Invariants
//!
//! - A node has at most one parent, and appears exactly once in that parent's
//!   child list.
//! - Inserting a fragment moves its children, leaving the fragment empty.
//! - A handle to a freed node never reaches the node that reuses its slot.
//! - Class names are stored in the `class` attribute, space separated and
//!   without duplicates.

mod debug_view;
mod document;
mod html;
mod selector;

#[cfg(test)]
mod tests;

pub use debug_view::{DebugModes, DebugView};
pub use document::{Document, NodeId, NodeKind};
pub use html::is_void_element;
pub use selector::{Selector, SelectorError};
