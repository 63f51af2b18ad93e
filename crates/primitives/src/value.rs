//! Script values and their string conversions.
//!
//! [`Value`] mirrors the handful of runtime types macro expressions can
//! produce. Conversions follow the loose rules authors expect from story
//! scripting: `Display` is the plain `String(value)` form, while
//! [`string_from`] is the bracketed form used when printing values into
//! passages.

use std::fmt;

/// A dynamically typed value produced by expression evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
	#[default]
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	String(String),
	List(Vec<Value>),
}

impl Value {
	/// Returns `true` for `null` and `undefined`.
	pub fn is_nullish(&self) -> bool {
		matches!(self, Self::Undefined | Self::Null)
	}

	/// Boolean coercion.
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Undefined | Self::Null => false,
			Self::Bool(b) => *b,
			Self::Number(n) => !(*n == 0.0 || n.is_nan()),
			Self::String(s) => !s.is_empty(),
			Self::List(_) => true,
		}
	}

	/// The `typeof` operator result.
	pub fn type_of(&self) -> &'static str {
		match self {
			Self::Undefined => "undefined",
			Self::Null | Self::List(_) => "object",
			Self::Bool(_) => "boolean",
			Self::Number(_) => "number",
			Self::String(_) => "string",
		}
	}

	/// Descriptive type name, distinguishing `null` and lists from other objects.
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::List(_) => "Array",
			other => other.type_of(),
		}
	}

	/// Numeric coercion.
	pub fn to_number(&self) -> f64 {
		match self {
			Self::Undefined => f64::NAN,
			Self::Null => 0.0,
			Self::Bool(b) => f64::from(u8::from(*b)),
			Self::Number(n) => *n,
			Self::String(s) => parse_number(s),
			Self::List(_) => parse_number(&self.to_string()),
		}
	}

	/// Borrows the string payload, if this is a string.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s),
			_ => None,
		}
	}

	/// Converts into a JSON value. Non-finite numbers and `undefined` become `null`.
	pub fn to_json(&self) -> serde_json::Value {
		use serde_json::Value as Json;

		match self {
			Self::Undefined | Self::Null => Json::Null,
			Self::Bool(b) => Json::Bool(*b),
			Self::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => Json::from(*n as i64),
			Self::Number(n) => serde_json::Number::from_f64(*n).map_or(Json::Null, Json::Number),
			Self::String(s) => Json::String(s.clone()),
			Self::List(items) => Json::Array(items.iter().map(Self::to_json).collect()),
		}
	}
}

impl From<&serde_json::Value> for Value {
	/// Objects have no script representation and are kept as their JSON text.
	fn from(json: &serde_json::Value) -> Self {
		use serde_json::Value as Json;

		match json {
			Json::Null => Self::Null,
			Json::Bool(b) => Self::Bool(*b),
			Json::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
			Json::String(s) => Self::String(s.clone()),
			Json::Array(items) => Self::List(items.iter().map(Self::from).collect()),
			Json::Object(_) => Self::String(json.to_string()),
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.to_owned())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Undefined => f.write_str("undefined"),
			Self::Null => f.write_str("null"),
			Self::Bool(b) => write!(f, "{b}"),
			Self::Number(n) => f.write_str(&format_number(*n)),
			Self::String(s) => f.write_str(s),
			Self::List(items) => {
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						f.write_str(",")?;
					}
					if !item.is_nullish() {
						write!(f, "{item}")?;
					}
				}
				Ok(())
			}
		}
	}
}

/// Formats a number the way scripts print it: integral values without a
/// fraction, exponent notation outside `[1e-6, 1e21)`.
pub fn format_number(n: f64) -> String {
	if n.is_nan() {
		return "NaN".into();
	}
	if n.is_infinite() {
		return if n > 0.0 { "Infinity".into() } else { "-Infinity".into() };
	}
	if n == 0.0 {
		return "0".into();
	}

	let abs = n.abs();
	if !(1e-6..1e21).contains(&abs) {
		let formatted = format!("{n:e}");
		return match formatted.split_once('e') {
			Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
			_ => formatted,
		};
	}

	format!("{n}")
}

/// Returns the simple string form of a value, or a bracketed description
/// when it has none.
pub fn string_from(value: &Value) -> String {
	match value {
		Value::Undefined => "[undefined]".into(),
		Value::Null => "[null]".into(),
		Value::Number(n) if n.is_nan() => "[number NaN]".into(),
		Value::List(items) => items.iter().map(string_from).collect::<Vec<_>>().join(", "),
		other => other.to_string(),
	}
}

fn parse_number(s: &str) -> f64 {
	let trimmed = s.trim();
	if trimmed.is_empty() {
		return 0.0;
	}

	let (sign, unsigned) = match trimmed.as_bytes()[0] {
		b'-' => (-1.0, &trimmed[1..]),
		b'+' => (1.0, &trimmed[1..]),
		_ => (1.0, trimmed),
	};

	if unsigned == "Infinity" {
		return sign * f64::INFINITY;
	}
	if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
		return u64::from_str_radix(hex, 16).map_or(f64::NAN, |v| v as f64);
	}
	if !unsigned.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-')) {
		return f64::NAN;
	}

	trimmed.parse().unwrap_or(f64::NAN)
}
