use quire_primitives::{Value, error_message};

/// Evaluation failures. `Display` yields the bare message, as scripts would
/// read it from an error's `message` property.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
	#[error("{0}")]
	Syntax(String),
	#[error("{0}")]
	Reference(String),
	#[error("{0}")]
	Type(String),
	/// A value raised by a `throw` statement.
	#[error("{}", thrown_message(.0))]
	Thrown(Value),
}

impl ScriptError {
	/// The script-visible error kind.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Syntax(_) => "SyntaxError",
			Self::Reference(_) => "ReferenceError",
			Self::Type(_) => "TypeError",
			Self::Thrown(_) => "Error",
		}
	}
}

fn thrown_message(value: &Value) -> String {
	if value.is_nullish() {
		return error_message(None);
	}
	error_message(Some(value))
}
