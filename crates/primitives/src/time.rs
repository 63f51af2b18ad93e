//! Conversions between CSS time strings and milliseconds.

use std::sync::LazyLock;

use regex::Regex;

use crate::value::format_number;

static CSS_TIME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([+-]?(?:\d*\.)?\d+)([Mm]?[Ss])$").expect("static regex"));

/// Errors from CSS time conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeError {
	#[error("invalid time value syntax: \"{0}\"")]
	Syntax(String),
	#[error("invalid time value: \"{0}\"")]
	Range(String),
	#[error("invalid milliseconds value: {0}")]
	Milliseconds(String),
}

/// Parses a CSS time (`"1.5s"`, `"250ms"`) into milliseconds.
pub fn css_time_to_ms(css_time: &str) -> Result<f64, TimeError> {
	let caps = CSS_TIME_RE.captures(css_time).ok_or_else(|| TimeError::Syntax(css_time.to_owned()))?;

	let mut msec: f64 = caps[1].parse().map_err(|_| TimeError::Syntax(css_time.to_owned()))?;
	if caps[2].len() == 1 {
		msec *= 1000.0;
	}

	if !msec.is_finite() {
		return Err(TimeError::Range(css_time.to_owned()));
	}
	Ok(msec)
}

/// Formats milliseconds as a CSS time string.
pub fn ms_to_css_time(msec: f64) -> Result<String, TimeError> {
	if !msec.is_finite() {
		return Err(TimeError::Milliseconds(format_number(msec)));
	}
	Ok(format!("{}ms", format_number(msec)))
}
