//! Canonical macro invocation types.
//!
//! The wikifier recognizes `<<name args>>` tags with [`parse_tag`], parses
//! argument strings into typed [`Argument`] values with [`parse_args`], and
//! groups bodied macro content into [`PayloadBlock`]s before dispatch.

mod args;
mod desugar;
mod lexer;
mod tag;

#[cfg(test)]
mod tests;

pub use args::{ArgContext, ArgError, Argument, LinkArg, MacroArgs, PayloadBlock, parse_args};
pub use desugar::desugar;
pub use tag::{MacroTag, is_valid_macro_name, parse_tag};
