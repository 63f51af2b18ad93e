//! Error message normalization.

use std::fmt::Display;

/// Returns the message for a failure value, or `"unknown error"` when the
/// value is absent or renders empty.
pub fn error_message(error: Option<&dyn Display>) -> String {
	match error.map(|e| e.to_string()) {
		Some(message) if !message.is_empty() => message,
		_ => "unknown error".to_owned(),
	}
}
