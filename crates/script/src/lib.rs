//! Default expression evaluator.
//!
//! # Role
//!
//! Macros hand expressions to a scripting collaborator: `print` evaluates
//! one, `set` runs one for its side effects, `script` runs a body that may
//! `print(...)` into the passage. This crate provides that collaborator as a
//! small JavaScript subset over [`State`], the story and temporary variables.
//!
//! TwineScript operators (`to`, `eq`, `$name`, ...) are desugared by the
//! caller before evaluation; this crate only sees plain script.
//!
//! # Invariants
//!
//! - Unknown identifiers raise a reference error; the only globals are
//!   `State`, `Math`, and the built-in functions.
//! - Reading an unset variable yields `undefined`; reading a property of
//!   `undefined` or `null` is a type error.

mod error;
mod interp;
mod lexer;
mod parser;
mod state;


pub use error::ScriptError;
pub use interp::{Interpreter, evaluate};
pub use state::{Scope, State};
