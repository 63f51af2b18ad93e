//! Macro registry.
//!
//! # Role
//!
//! Maps macro names to handler definitions. A name is bound either to a full
//! [`MacroDef`] or to an alias of an already-registered macro. Bodied macros
//! also claim their closing tags (`/name`, `endname`) and child tags in a
//! [`TagIndex`], so the wikifier can tell stray child tags from unknown macros.
//!
//! # Invariants
//!
//! - A name is either a macro or a tag, never both.
//! - Aliases always point at a macro that existed when the alias was added and
//!   store that macro's root definition, so alias chains cannot form cycles and
//!   resolve in a single lookup.
//! - Multi-name registrations are atomic: on error nothing is registered.

mod def;
mod error;
mod registry;
mod tags;

#[cfg(test)]
mod tests;

pub use def::{MacroDef, Registration, SkipArgs, Tags};
pub use error::RegistryError;
pub use registry::{IntoNames, MacroRegistry, Resolved};
pub use tags::TagIndex;
