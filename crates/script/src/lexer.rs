use crate::ScriptError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
	Number(f64),
	Str(String),
	Ident(String),
	Punct(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
	pub token: Token,
	/// A line terminator precedes this token.
	pub newline_before: bool,
}

/// Longest first, so prefixes never shadow longer operators.
const PUNCTUATORS: &[&str] = &[
	"===", "!==", "==", "!=", "<=", ">=", "&&", "||", "??", "+=", "-=", "*=", "/=", "%=", "+", "-", "*", "/", "%", "<", ">", "!", "=",
	"(", ")", "[", "]", ",", ".", "?", ":", ";",
];

fn is_ident_start(c: char) -> bool {
	c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
	c.is_alphanumeric() || c == '_' || c == '$'
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ScriptError> {
	let mut tokens = Vec::new();
	let mut chars = source.char_indices().peekable();
	let mut newline_before = false;

	while let Some(&(pos, c)) = chars.peek() {
		if c == '\n' || c == '\r' || c == '\u{2028}' || c == '\u{2029}' {
			newline_before = true;
			chars.next();
			continue;
		}
		if c.is_whitespace() {
			chars.next();
			continue;
		}

		let rest = &source[pos..];
		if rest.starts_with("//") {
			while chars.peek().is_some_and(|&(_, c)| c != '\n') {
				chars.next();
			}
			continue;
		}
		if let Some(body) = rest.strip_prefix("/*") {
			let end = body.find("*/").ok_or_else(|| ScriptError::Syntax("Invalid or unexpected token".into()))?;
			newline_before |= body[..end].contains('\n');
			let stop = pos + 2 + end + 2;
			while chars.peek().is_some_and(|&(i, _)| i < stop) {
				chars.next();
			}
			continue;
		}

		let token = if c.is_ascii_digit() || (c == '.' && rest[1..].starts_with(|c: char| c.is_ascii_digit())) {
			let len = number_len(rest);
			let text = &rest[..len];
			while chars.peek().is_some_and(|&(i, _)| i < pos + len) {
				chars.next();
			}
			Token::Number(parse_number_literal(text)?)
		} else if c == '"' || c == '\'' {
			chars.next();
			Token::Str(read_string(&mut chars, c)?)
		} else if is_ident_start(c) {
			let mut ident = String::new();
			while let Some(&(_, c)) = chars.peek() {
				if !is_ident_part(c) {
					break;
				}
				ident.push(c);
				chars.next();
			}
			Token::Ident(ident)
		} else if let Some(punct) = PUNCTUATORS.iter().copied().find(|p| rest.starts_with(*p)) {
			for _ in 0..punct.len() {
				chars.next();
			}
			Token::Punct(punct)
		} else {
			return Err(ScriptError::Syntax(format!("Invalid or unexpected token '{c}'")));
		};

		tokens.push(Spanned { token, newline_before });
		newline_before = false;
	}

	Ok(tokens)
}

fn number_len(rest: &str) -> usize {
	let bytes = rest.as_bytes();
	if bytes.len() > 1 && bytes[0] == b'0' && matches!(bytes[1], b'x' | b'X') {
		return 2 + bytes[2..].iter().take_while(|b| b.is_ascii_hexdigit()).count();
	}

	let mut i = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
	if bytes.get(i) == Some(&b'.') {
		i += 1;
		i += bytes[i..].iter().take_while(|b| b.is_ascii_digit()).count();
	}
	if matches!(bytes.get(i), Some(b'e' | b'E')) {
		let mut j = i + 1;
		if matches!(bytes.get(j), Some(b'+' | b'-')) {
			j += 1;
		}
		let digits = bytes[j..].iter().take_while(|b| b.is_ascii_digit()).count();
		if digits > 0 {
			i = j + digits;
		}
	}
	i
}

fn parse_number_literal(text: &str) -> Result<f64, ScriptError> {
	let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
		Some(hex) => u64::from_str_radix(hex, 16).ok().map(|v| v as f64),
		None => text.parse().ok(),
	};
	parsed.ok_or_else(|| ScriptError::Syntax(format!("Invalid number '{text}'")))
}

fn read_string(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, quote: char) -> Result<String, ScriptError> {
	let unterminated = || ScriptError::Syntax("Invalid or unexpected token".into());
	let mut out = String::new();
	loop {
		let (_, c) = chars.next().ok_or_else(unterminated)?;
		match c {
			c if c == quote => return Ok(out),
			'\n' => return Err(unterminated()),
			'\\' => {
				let (_, escaped) = chars.next().ok_or_else(unterminated)?;
				match escaped {
					'n' => out.push('\n'),
					't' => out.push('\t'),
					'r' => out.push('\r'),
					'b' => out.push('\u{8}'),
					'f' => out.push('\u{c}'),
					'v' => out.push('\u{b}'),
					'0' => out.push('\0'),
					'\n' => {}
					'x' => out.push(read_hex_escape(chars, 2)?),
					'u' => out.push(read_hex_escape(chars, 4)?),
					other => out.push(other),
				}
			}
			other => out.push(other),
		}
	}
}

fn read_hex_escape(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, digits: usize) -> Result<char, ScriptError> {
	let invalid = || ScriptError::Syntax("Invalid hexadecimal escape sequence".into());
	let mut code = 0u32;
	for _ in 0..digits {
		let (_, c) = chars.next().ok_or_else(invalid)?;
		code = code * 16 + c.to_digit(16).ok_or_else(invalid)?;
	}
	Ok(char::from_u32(code).unwrap_or('\u{fffd}'))
}
