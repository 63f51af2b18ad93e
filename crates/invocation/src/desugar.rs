//! TwineScript to JavaScript desugaring.

use std::sync::LazyLock;

use regex::Regex;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(concat!(
		r#"(""|'')"#,
		r#"|("(?:\\.|[^"\\])+")"#,
		r#"|('(?:\\.|[^'\\])+')"#,
		r#"|([=+\-*/%<>&|^~!?:,;()\[\]{}]+)"#,
		r#"|([^"'=+\-*/%<>&|^~!?:,;()\[\]{}\s]+)"#,
	))
	.expect("static regex")
});
static VARIABLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[$_][$A-Z_a-z][$0-9A-Z_a-z]*").expect("static regex"));
static NOT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s+not\b").expect("static regex"));

fn mapping(token: &str) -> Option<&'static str> {
	Some(match token {
		"$" => "State.variables.",
		"_" => "State.temporary.",
		"to" => "=",
		"eq" => "==",
		"neq" => "!=",
		"is" => "===",
		"isnot" => "!==",
		"gt" => ">",
		"gte" => ">=",
		"lt" => "<",
		"lte" => "<=",
		"and" => "&&",
		"or" => "||",
		"not" => "!",
		"def" => "\"undefined\" !== typeof",
		"ndef" => "\"undefined\" === typeof",
		_ => return None,
	})
}

/// Rewrites TwineScript sugar into plain expression syntax.
///
/// `$name` and `_name` become `State.variables.name` and
/// `State.temporary.name`; operator keywords (`to`, `eq`, `is`, `and`, ...)
/// become their symbolic forms, with `is not` merged into `!==`. Quoted
/// strings pass through untouched.
pub fn desugar(code: &str) -> String {
	let mut out = String::with_capacity(code.len() + 16);
	let mut copied = 0;
	let mut pos = 0;

	while let Some(caps) = TOKEN_RE.captures_at(code, pos) {
		let whole = caps.get(0).map_or(pos..pos, |m| m.range());
		pos = whole.end;

		let Some(word) = caps.get(5) else {
			continue;
		};

		let mut token = word.as_str();
		if token == "$" || token == "_" {
			continue;
		}

		let mut end = word.end();
		if VARIABLE_RE.is_match(token) {
			token = &token[..1];
			end = word.start() + 1;
		} else if token == "is"
			&& let Some(not) = NOT_RE.find(&code[word.end()..])
		{
			token = "isnot";
			end = word.end() + not.end();
			pos = end;
		}

		if let Some(replacement) = mapping(token) {
			out.push_str(&code[copied..word.start()]);
			out.push_str(replacement);
			copied = end;
		}
	}

	out.push_str(&code[copied..]);
	out
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case("$gold to 5", "State.variables.gold = 5")]
	#[case("_i gte 2 and not $done", "State.temporary.i >= 2 && ! State.variables.done")]
	#[case("$a is not $b", "State.variables.a !== State.variables.b")]
	#[case("$a isnot $b", "State.variables.a !== State.variables.b")]
	#[case("def $x", "\"undefined\" !== typeof State.variables.x")]
	#[case("\"$a to b\" + 'is'", "\"$a to b\" + 'is'")]
	#[case("$obj.is", "State.variables.obj.is")]
	#[case("island eq 1", "island == 1")]
	#[case("$ + _", "$ + _")]
	fn test_desugar(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(desugar(input), expected);
	}
}
