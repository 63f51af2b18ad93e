//! Macro tag recognition.

/// A single `<<name args>>` tag located in wikitext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroTag {
	/// Tag name, including a leading `/` for closing tags.
	pub name: String,
	/// Unparsed argument text.
	pub args: String,
	/// Byte offset of the opening `<<`.
	pub start: usize,
	/// Byte offset just past the closing `>>`.
	pub end: usize,
}

impl MacroTag {
	/// Returns a human-readable description, e.g. for logs.
	pub fn describe(&self) -> String {
		if self.args.is_empty() {
			format!("<<{}>>", self.name)
		} else {
			format!("<<{} {}>>", self.name, self.args)
		}
	}

	/// Returns `true` if the tag carries any non-whitespace arguments.
	pub fn has_args(&self) -> bool {
		!self.args.trim().is_empty()
	}
}

/// Returns `true` if `name` is a legal macro name: a letter followed by word
/// characters or hyphens, or one of the single-character names `=` and `-`.
pub fn is_valid_macro_name(name: &str) -> bool {
	let bytes = name.as_bytes();
	match bytes {
		[b'=' | b'-'] => true,
		[first, rest @ ..] => first.is_ascii_alphabetic() && rest.iter().all(|&b| is_name_byte(b)),
		[] => false,
	}
}

fn is_name_byte(b: u8) -> bool {
	b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Parses a macro tag beginning exactly at `start`.
///
/// Arguments may contain quoted strings, backquoted expressions, block and
/// line comments, and `[[…]]` markup, any of which may include `>>` without
/// terminating the tag. Returns `None` if no well-formed tag starts here.
pub fn parse_tag(source: &str, start: usize) -> Option<MacroTag> {
	let bytes = source.as_bytes();
	if !source.get(start..)?.starts_with("<<") {
		return None;
	}

	let mut pos = start + 2;
	let name_start = pos;
	if bytes.get(pos) == Some(&b'/') {
		pos += 1;
	}
	match bytes.get(pos) {
		Some(b) if b.is_ascii_alphabetic() => {
			pos += 1;
			while bytes.get(pos).is_some_and(|&b| is_name_byte(b)) {
				pos += 1;
			}
		}
		Some(b'=' | b'-') if pos == name_start => pos += 1,
		_ => return None,
	}
	let name_end = pos;

	while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
		pos += 1;
	}
	let args_start = pos;

	loop {
		if pos >= bytes.len() {
			return None;
		}
		if bytes[pos..].starts_with(b">>") {
			break;
		}
		pos = skip_arg_segment(source, pos);
	}

	Some(MacroTag {
		name: source[name_start..name_end].to_owned(),
		args: source[args_start..pos].to_owned(),
		start,
		end: pos + 2,
	})
}

/// Skips one argument segment: a comment, quoted run, bracketed markup, or a
/// single character.
fn skip_arg_segment(source: &str, pos: usize) -> usize {
	let rest = &source[pos..];
	let bytes = rest.as_bytes();

	let skipped = match bytes[0] {
		b'/' if rest.starts_with("/*") => rest[2..].find("*/").map(|i| i + 4),
		b'/' if rest.starts_with("//") => rest.find('\n').map(|i| i + 1),
		quote @ (b'`' | b'"' | b'\'') => quoted_len(bytes, quote),
		b'[' => square_bracket_len(rest),
		_ => None,
	};

	pos + skipped.unwrap_or_else(|| rest.chars().next().map_or(1, char::len_utf8))
}

/// Length of a quoted run including both quotes, honoring backslash escapes.
pub(crate) fn quoted_len(bytes: &[u8], quote: u8) -> Option<usize> {
	let mut i = 1;
	while i < bytes.len() {
		match bytes[i] {
			b'\\' => i += 2,
			b if b == quote => return Some(i + 1),
			_ => i += 1,
		}
	}
	None
}

/// Length of `[[…]]` or `[img[…]]` markup on a single line.
fn square_bracket_len(rest: &str) -> Option<usize> {
	let bytes = rest.as_bytes();
	let mut i = 1;
	if matches!(bytes.get(i), Some(b'<' | b'>')) {
		i += 1;
	}
	if rest.get(i..i + 3).is_some_and(|s| s.eq_ignore_ascii_case("img")) {
		i += 3;
	}
	if bytes.get(i) != Some(&b'[') {
		return None;
	}

	let line_end = rest.find(['\r', '\n']).unwrap_or(rest.len());
	let close = rest[i + 1..line_end].find("]]")? + i + 1;
	let mut end = close + 2;
	while bytes.get(end) == Some(&b']') {
		end += 1;
	}
	Some(end)
}
