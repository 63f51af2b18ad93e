//! Escaping and sanitizing helpers for text headed into markup.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static ESCAPED_HTML_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)&(?:amp|#38|#x26|lt|#60|#x3c|gt|#62|#x3e|quot|#34|#x22|apos|#39|#x27|#96|#x60);").expect("static regex"));

static SLUG_STRIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s\u{2013}\u{2014}-]+").expect("static regex"));
static SLUG_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_\s\u{2013}\u{2014}-]+").expect("static regex"));
static SLUG_ILLEGAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\x00-\x20!-/:-@\[-\^`{-\x{9f}]+").expect("static regex"));
static FILENAME_ILLEGAL_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r##"[\x00-\x1f"#$%&'*+,/:;<=>?\\^`|\x7f-\x{9f}]+"##).expect("static regex"));

fn replace_chars<'a>(input: &'a str, table: impl Fn(char) -> Option<&'static str>) -> Cow<'a, str> {
	if !input.chars().any(|ch| table(ch).is_some()) {
		return Cow::Borrowed(input);
	}

	let mut out = String::with_capacity(input.len() + 16);
	for ch in input.chars() {
		match table(ch) {
			Some(entity) => out.push_str(entity),
			None => out.push(ch),
		}
	}
	Cow::Owned(out)
}

/// Escapes the five HTML special characters and the backquote.
pub fn encode_entities(input: &str) -> Cow<'_, str> {
	replace_chars(input, |ch| match ch {
		'&' => Some("&amp;"),
		'<' => Some("&lt;"),
		'>' => Some("&gt;"),
		'"' => Some("&quot;"),
		'\'' => Some("&#39;"),
		'`' => Some("&#96;"),
		_ => None,
	})
}

/// Escapes HTML special characters plus markup metacharacters, so the result
/// renders literally when fed back through the wikifier.
pub fn encode_markup(input: &str) -> Cow<'_, str> {
	replace_chars(input, |ch| match ch {
		'!' => Some("&#33;"),
		'"' => Some("&quot;"),
		'#' => Some("&#35;"),
		'$' => Some("&#36;"),
		'&' => Some("&amp;"),
		'\'' => Some("&#39;"),
		'*' => Some("&#42;"),
		'-' => Some("&#45;"),
		'/' => Some("&#47;"),
		'<' => Some("&lt;"),
		'=' => Some("&#61;"),
		'>' => Some("&gt;"),
		'?' => Some("&#63;"),
		'@' => Some("&#64;"),
		'[' => Some("&#91;"),
		'\\' => Some("&#92;"),
		']' => Some("&#93;"),
		'^' => Some("&#94;"),
		'_' => Some("&#95;"),
		'`' => Some("&#96;"),
		'{' => Some("&#123;"),
		'|' => Some("&#124;"),
		'}' => Some("&#125;"),
		'~' => Some("&#126;"),
		_ => None,
	})
}

/// Decodes the entities [`encode_entities`] produces, plus their common
/// numeric and `&apos;` spellings. Matching is case-insensitive.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
	ESCAPED_HTML_RE.replace_all(input, |caps: &regex::Captures<'_>| {
		match caps[0].to_ascii_lowercase().as_str() {
			"&amp;" | "&#38;" | "&#x26;" => "&",
			"&lt;" | "&#60;" | "&#x3c;" => "<",
			"&gt;" | "&#62;" | "&#x3e;" => ">",
			"&quot;" | "&#34;" | "&#x22;" => "\"",
			"&apos;" | "&#39;" | "&#x27;" => "'",
			_ => "`",
		}
		.to_owned()
	})
}

/// Quotes a string with whichever quote character needs less escaping.
pub fn enquote(input: &str) -> String {
	let mut double = 0usize;
	let mut single = 0usize;
	let mut chars = input.chars();
	while let Some(ch) = chars.next() {
		match ch {
			'\\' => {
				chars.next();
			}
			'"' => double += 1,
			'\'' => single += 1,
			_ => {}
		}
	}

	if double == 0 {
		return format!("\"{input}\"");
	}
	if single == 0 {
		return format!("'{input}'");
	}

	let quote = if double <= single { '"' } else { '\'' };
	let mut out = String::with_capacity(input.len() + 8);
	out.push(quote);
	let mut escaped = false;
	for ch in input.chars() {
		if ch == quote && !escaped {
			out.push('\\');
		}
		escaped = ch == '\\' && !escaped;
		out.push(ch);
	}
	out.push(quote);
	out
}

/// Produces a string usable as a DOM id or class name.
///
/// Prefers the lowercase hyphenated form; falls back to stripping illegal
/// characters when that form would be empty (e.g. non-word names).
pub fn create_slug(input: &str) -> String {
	let base = input.trim();

	let legacy = SLUG_STRIP_RE.replace_all(base, "");
	let legacy = SLUG_SEPARATOR_RE.replace_all(&legacy, "-").to_lowercase();
	if !legacy.chars().all(|ch| ch == '-') {
		return legacy;
	}

	let unsigiled = match base.strip_prefix('$') {
		Some(rest) => Cow::Borrowed(rest),
		None => match base.strip_prefix('_') {
			Some(rest) => Cow::Owned(format!("-{rest}")),
			None => Cow::Borrowed(base),
		},
	};
	SLUG_ILLEGAL_RE.replace_all(&unsigiled, "").into_owned()
}

/// Strips characters that are illegal in Windows or Unix filenames.
pub fn create_filename(input: &str) -> String {
	FILENAME_ILLEGAL_RE.replace_all(input.trim(), "").into_owned()
}
