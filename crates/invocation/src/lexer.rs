//! Lexer for macro argument strings.

use crate::tag::quoted_len;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemKind {
	Bareword,
	/// Backquoted expression, quotes included.
	Expression,
	/// Single or double quoted string, quotes included.
	String,
	/// `[[…]]` markup.
	SquareBracket,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Item<'a> {
	pub kind: ItemKind,
	pub text: &'a str,
}

/// A lexing failure: the offending text and a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LexError {
	pub text: String,
	pub message: &'static str,
}

/// Splits a raw argument string into items separated by whitespace.
///
/// Whitespace is Unicode whitespace throughout, so every item is non-empty.
pub(crate) fn lex(raw: &str) -> Result<Vec<Item<'_>>, LexError> {
	let bytes = raw.as_bytes();
	let mut items = Vec::new();
	let mut pos = 0;

	loop {
		pos = raw.len() - raw[pos..].trim_start().len();
		if pos >= bytes.len() {
			return Ok(items);
		}

		let rest = &raw[pos..];
		let (kind, len) = match bytes[pos] {
			b'`' => (ItemKind::Expression, quoted(rest, b'`', "unterminated backquote expression")?),
			b'"' => (ItemKind::String, quoted(rest, b'"', "unterminated double quoted string")?),
			b'\'' => (ItemKind::String, quoted(rest, b'\'', "unterminated single quoted string")?),
			b'[' => (ItemKind::SquareBracket, square_bracket(rest)?),
			_ => (ItemKind::Bareword, rest.find(|c: char| c.is_whitespace()).unwrap_or(rest.len())),
		};

		items.push(Item { kind, text: &rest[..len] });
		pos += len;
	}
}

fn quoted(rest: &str, quote: u8, message: &'static str) -> Result<usize, LexError> {
	match quoted_len(rest.as_bytes(), quote) {
		Some(len) if !rest[..len].contains('\n') => Ok(len),
		_ => Err(LexError { text: rest.to_owned(), message }),
	}
}

fn square_bracket(rest: &str) -> Result<usize, LexError> {
	let bytes = rest.as_bytes();
	let error = |message| LexError { text: rest.to_owned(), message };

	if matches!(bytes.get(1), Some(b'<' | b'>' | b'I' | b'i' | b'M' | b'm' | b'G' | b'g')) {
		return Err(error("image markup is not supported"));
	}
	if bytes.get(1) != Some(&b'[') {
		return Err(error("malformed link markup"));
	}

	let mut depth = 2i32;
	let mut i = 2;
	while i < bytes.len() {
		match bytes[i] {
			b'\\' => {
				if matches!(bytes.get(i + 1), None | Some(b'\n')) {
					return Err(error("unterminated link markup"));
				}
				i += 1;
			}
			b'\n' => return Err(error("unterminated link markup")),
			b'[' => depth += 1,
			b']' => {
				depth -= 1;
				if depth < 0 {
					return Err(error("unexpected right square bracket ']'"));
				}
				if depth == 1 && bytes.get(i + 1) == Some(&b']') {
					return Ok(i + 2);
				}
			}
			_ => {}
		}
		i += 1;
	}

	Err(error("unterminated link markup"))
}
