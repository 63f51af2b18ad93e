//! Shared value and text primitives for the quire macro core.

/// Error message normalization.
pub mod error;
/// Entity, markup, slug, and filename helpers.
pub mod text;
/// CSS time string conversions.
pub mod time;
/// Dynamically typed script values.
pub mod value;

pub use error::error_message;
pub use text::{create_filename, create_slug, decode_entities, encode_entities, encode_markup, enquote};
pub use time::{TimeError, css_time_to_ms, ms_to_css_time};
pub use value::{Value, format_number, string_from};
