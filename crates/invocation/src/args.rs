//! Typed macro arguments and payload blocks.

use std::fmt;
use std::ops::Index;
use std::sync::LazyLock;

use quire_primitives::{Value, format_number};
use regex::Regex;

use crate::desugar::desugar;
use crate::lexer::{ItemKind, lex};

static VARIABLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[$_][$A-Z_a-z][$0-9A-Z_a-z]*").expect("static regex"));
static EXTERNAL_URL_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"(?i)^(?:file|https?|mailto|ftp|javascript|irc|news|data):[^\s'"]+"#).expect("static regex"));

/// A `[[…]]` link given as a macro argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkArg {
	/// Display text; equal to `link` when none was given.
	pub text: String,
	/// Passage name or URL.
	pub link: String,
	/// Desugared setter expression from `[[…][setter]]`.
	pub setter: Option<String>,
	/// Whether `link` points outside the story.
	pub external: bool,
}

/// A single parsed macro argument.
///
/// The variant is decided by the literal syntax in the author's source, or by
/// the current value of a substituted variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	Text(String),
	Link(LinkArg),
}

impl Argument {
	/// Borrows the text, if this is a text argument.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			_ => None,
		}
	}

	/// Borrows the link, if this is a link argument.
	pub fn as_link(&self) -> Option<&LinkArg> {
		match self {
			Self::Link(link) => Some(link),
			_ => None,
		}
	}

	/// Resolves the argument as a passage reference: links yield their target,
	/// everything else its string form.
	pub fn passage_name(&self) -> String {
		match self {
			Self::Link(link) => link.link.clone(),
			other => other.to_string(),
		}
	}

	/// Converts back into a script value. Links become their target string.
	pub fn to_value(&self) -> Value {
		match self {
			Self::Undefined => Value::Undefined,
			Self::Null => Value::Null,
			Self::Bool(b) => Value::Bool(*b),
			Self::Number(n) => Value::Number(*n),
			Self::Text(text) => Value::String(text.clone()),
			Self::Link(link) => Value::String(link.link.clone()),
		}
	}
}

impl From<Value> for Argument {
	/// Lists have no argument form and are passed as their string form.
	fn from(value: Value) -> Self {
		match value {
			Value::Undefined => Self::Undefined,
			Value::Null => Self::Null,
			Value::Bool(b) => Self::Bool(b),
			Value::Number(n) => Self::Number(n),
			Value::String(s) => Self::Text(s),
			list @ Value::List(_) => Self::Text(list.to_string()),
		}
	}
}

impl fmt::Display for Argument {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Undefined => f.write_str("undefined"),
			Self::Null => f.write_str("null"),
			Self::Bool(b) => write!(f, "{b}"),
			Self::Number(n) => f.write_str(&format_number(*n)),
			Self::Text(text) => f.write_str(text),
			Self::Link(link) => f.write_str(&link.link),
		}
	}
}

/// Parsed arguments plus the raw and desugared argument text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroArgs {
	values: Vec<Argument>,
	raw: String,
	full: String,
}

impl MacroArgs {
	/// Builds arguments from already-parsed values and their source text.
	pub fn new(values: Vec<Argument>, raw: impl Into<String>) -> Self {
		let raw = raw.into();
		let full = desugar(&raw);
		Self { values, raw, full }
	}

	/// Builds arguments that were not parsed (`skip_args` macros).
	pub fn unparsed(raw: impl Into<String>) -> Self {
		Self::new(Vec::new(), raw)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&Argument> {
		self.values.get(index)
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Argument> {
		self.values.iter()
	}

	/// The argument text exactly as written.
	pub fn raw(&self) -> &str {
		&self.raw
	}

	/// The argument text with TwineScript sugar expanded.
	pub fn full(&self) -> &str {
		&self.full
	}
}

impl Index<usize> for MacroArgs {
	type Output = Argument;

	fn index(&self, index: usize) -> &Argument {
		&self.values[index]
	}
}

impl<'a> IntoIterator for &'a MacroArgs {
	type Item = &'a Argument;
	type IntoIter = std::slice::Iter<'a, Argument>;

	fn into_iter(self) -> Self::IntoIter {
		self.values.iter()
	}
}

/// One block of a bodied macro: the opening tag or a child tag, and the
/// content up to the next tag.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadBlock {
	/// Tag name that opened this block.
	pub name: String,
	/// Source text of the opening tag.
	pub source: String,
	pub args: MacroArgs,
	/// Raw wikitext inside the block.
	pub contents: String,
}

/// Host services needed while parsing arguments.
pub trait ArgContext {
	/// Current value of a `$story` or `_temporary` variable (sigil included).
	fn variable(&self, name: &str) -> Value;

	/// Evaluates a TwineScript expression.
	fn evaluate(&mut self, expr: &str) -> Result<Value, String>;

	/// Whether a passage with this name exists.
	fn has_passage(&self, _name: &str) -> bool {
		false
	}
}

/// Argument parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
	#[error("unable to parse macro argument \"{text}\": {message}")]
	Malformed { text: String, message: String },
	#[error("unable to parse macro argument expression \"{expr}\": {message}")]
	Expression { expr: String, message: String },
}

/// Parses a raw argument string into typed arguments.
///
/// Barewords naming variables are substituted; `null`, `undefined`, `true`,
/// `false`, `NaN` and numeric literals become their values; other barewords
/// stay text. Backquoted expressions are evaluated, quoted strings unescaped,
/// and `[[…]]` markup becomes a [`LinkArg`].
pub fn parse_args(raw: &str, ctx: &mut dyn ArgContext) -> Result<MacroArgs, ArgError> {
	let items = lex(raw).map_err(|err| ArgError::Malformed {
		text: err.text,
		message: err.message.to_owned(),
	})?;

	let mut values = Vec::with_capacity(items.len());
	for item in items {
		let text = item.text;
		let arg = match item.kind {
			ItemKind::Bareword => parse_bareword(text, ctx)?,
			ItemKind::Expression => {
				let expr = text[1..text.len() - 1].trim();
				if expr.is_empty() {
					Argument::Undefined
				} else {
					ctx.evaluate(&format!("({})", desugar(expr)))
						.map(Argument::from)
						.map_err(|message| ArgError::Expression {
							expr: expr.to_owned(),
							message,
						})?
				}
			}
			ItemKind::String => Argument::Text(unescape(&text[1..text.len() - 1])),
			ItemKind::SquareBracket => Argument::Link(parse_link(text, ctx)),
		};
		values.push(arg);
	}

	Ok(MacroArgs::new(values, raw))
}

fn parse_bareword(text: &str, ctx: &mut dyn ArgContext) -> Result<Argument, ArgError> {
	if let Some(var) = VARIABLE_RE.find(text) {
		if var.end() == text.len() {
			return Ok(ctx.variable(text).into());
		}
		return ctx.evaluate(&desugar(text)).map(Argument::from).map_err(|message| ArgError::Malformed {
			text: text.to_owned(),
			message,
		});
	}

	Ok(match text {
		"null" => Argument::Null,
		"undefined" => Argument::Undefined,
		"true" => Argument::Bool(true),
		"false" => Argument::Bool(false),
		"NaN" => Argument::Number(f64::NAN),
		_ => match Value::from(text).to_number() {
			n if n.is_nan() => Argument::Text(text.to_owned()),
			n => Argument::Number(n),
		},
	})
}

fn parse_link(text: &str, ctx: &dyn ArgContext) -> LinkArg {
	let inner = &text[2..text.len() - 2];
	let (target, setter) = match inner.split_once("][") {
		Some((target, setter)) => (target, Some(desugar(setter))),
		None => (inner, None),
	};

	let (text, link) = if let Some((text, link)) = target.split_once('|') {
		(text, link)
	} else if let Some((text, link)) = target.rsplit_once("->") {
		(text, link)
	} else if let Some((link, text)) = target.split_once("<-") {
		(text, link)
	} else {
		(target, target)
	};

	let external = !ctx.has_passage(link) && (EXTERNAL_URL_RE.is_match(link) || link.contains(['/', '\\', '?']));
	LinkArg {
		text: text.to_owned(),
		link: link.to_owned(),
		setter,
		external,
	}
}

/// Processes backslash escapes in a quoted string body.
fn unescape(body: &str) -> String {
	let mut out = String::with_capacity(body.len());
	let mut chars = body.chars().peekable();

	while let Some(ch) = chars.next() {
		if ch != '\\' {
			out.push(ch);
			continue;
		}
		match chars.next() {
			Some('n') => out.push('\n'),
			Some('t') => out.push('\t'),
			Some('r') => out.push('\r'),
			Some('b') => out.push('\u{8}'),
			Some('f') => out.push('\u{c}'),
			Some('v') => out.push('\u{b}'),
			Some('0') => out.push('\0'),
			Some('x') => push_code(&mut out, &mut chars, 2, "x"),
			Some('u') if chars.peek() == Some(&'{') => {
				chars.next();
				let hex: String = chars.by_ref().take_while(|&c| c != '}').collect();
				match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
					Some(c) => out.push(c),
					None => out.push_str(&format!("u{{{hex}}}")),
				}
			}
			Some('u') => push_code(&mut out, &mut chars, 4, "u"),
			Some('\n') => {}
			Some(other) => out.push(other),
			None => out.push('\\'),
		}
	}

	out
}

fn push_code(out: &mut String, chars: &mut std::iter::Peekable<std::str::Chars<'_>>, digits: usize, prefix: &str) {
	let mut hex = String::with_capacity(digits);
	while hex.len() < digits && chars.peek().is_some_and(char::is_ascii_hexdigit) {
		hex.extend(chars.next());
	}
	match u32::from_str_radix(&hex, 16).ok().filter(|_| hex.len() == digits).and_then(char::from_u32) {
		Some(c) => out.push(c),
		None => {
			out.push_str(prefix);
			out.push_str(&hex);
		}
	}
}

#[cfg(test)]
mod unit_tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn test_unescape() {
		assert_eq!(unescape(r#"a\"b\n\x41é\u{1F600}\q"#), "a\"b\nAé😀q");
		assert_eq!(unescape(r"\xZ"), "xZ");
	}
}
