use pretty_assertions::assert_eq;
use proptest::prelude::*;
use quire_primitives::Value;

use super::*;

/// Resolves `$gold` to 12 and evaluates only the literal expression `(1 + 2)`.
struct FakeContext {
	evaluated: Vec<String>,
}

impl ArgContext for FakeContext {
	fn variable(&self, name: &str) -> Value {
		match name {
			"$gold" => Value::Number(12.0),
			"_list" => Value::List(vec![Value::from("a"), Value::from("b")]),
			_ => Value::Undefined,
		}
	}

	fn evaluate(&mut self, expr: &str) -> Result<Value, String> {
		self.evaluated.push(expr.to_owned());
		match expr {
			"(1 + 2)" => Ok(Value::Number(3.0)),
			_ => Err("bad expression".into()),
		}
	}

	fn has_passage(&self, name: &str) -> bool {
		name == "Home"
	}
}

fn ctx() -> FakeContext {
	FakeContext { evaluated: Vec::new() }
}

#[test]
fn test_parse_literal_barewords() {
	let args = parse_args("null undefined true false NaN 42 -1.5 hello", &mut ctx()).expect("args");
	assert_eq!(args.len(), 8);
	assert_eq!(args[0], Argument::Null);
	assert_eq!(args[1], Argument::Undefined);
	assert_eq!(args[2], Argument::Bool(true));
	assert_eq!(args[3], Argument::Bool(false));
	assert!(matches!(args[4], Argument::Number(n) if n.is_nan()));
	assert_eq!(args[5], Argument::Number(42.0));
	assert_eq!(args[6], Argument::Number(-1.5));
	assert_eq!(args[7], Argument::Text("hello".into()));
}

#[test]
fn test_variables_are_substituted() {
	let args = parse_args("$gold $missing _list", &mut ctx()).expect("args");
	assert_eq!(args[0], Argument::Number(12.0));
	assert_eq!(args[1], Argument::Undefined);
	assert_eq!(args[2], Argument::Text("a,b".into()));
}

#[test]
fn test_backquoted_expressions_are_desugared_and_evaluated() {
	let mut ctx = ctx();
	let args = parse_args("`1 + 2` ``", &mut ctx).expect("args");
	assert_eq!(args[0], Argument::Number(3.0));
	assert_eq!(args[1], Argument::Undefined);
	assert_eq!(ctx.evaluated, vec!["(1 + 2)".to_owned()]);

	let err = parse_args("`$x gt`", &mut ctx).unwrap_err();
	assert_eq!(err.to_string(), "unable to parse macro argument expression \"$x gt\": bad expression");
	assert_eq!(ctx.evaluated.last().map(String::as_str), Some("(State.variables.x >)"));
}

#[test]
fn test_quoted_strings_are_unescaped() {
	let args = parse_args(r##""#box .item" 'it\'s'"##, &mut ctx()).expect("args");
	assert_eq!(args[0].as_text(), Some("#box .item"));
	assert_eq!(args[1].as_text(), Some("it's"));
}

#[test]
fn test_link_arguments() {
	let args = parse_args("[[Home]] [[Go on|Chapter 2][$seen to true]] [[Back<-Home]] [[docs->https://example.com]]", &mut ctx()).expect("args");

	let home = args[0].as_link().expect("link");
	assert_eq!((home.text.as_str(), home.link.as_str(), home.external), ("Home", "Home", false));

	let chapter = args[1].as_link().expect("link");
	assert_eq!(chapter.text, "Go on");
	assert_eq!(chapter.link, "Chapter 2");
	assert_eq!(chapter.setter.as_deref(), Some("State.variables.seen = true"));

	let back = args[2].as_link().expect("link");
	assert_eq!((back.text.as_str(), back.link.as_str()), ("Home", "Back"));

	let docs = args[3].as_link().expect("link");
	assert!(docs.external);
	assert_eq!(args[3].passage_name(), "https://example.com");
}

#[test]
fn test_lex_errors_name_the_argument() {
	let err = parse_args("'open", &mut ctx()).unwrap_err();
	assert_eq!(err.to_string(), "unable to parse macro argument \"'open\": unterminated single quoted string");
}

#[test]
fn test_raw_and_full_text_are_kept() {
	let args = parse_args("$gold gt 3", &mut ctx()).expect("args");
	assert_eq!(args.raw(), "$gold gt 3");
	assert_eq!(args.full(), "State.variables.gold > 3");

	let unparsed = MacroArgs::unparsed("_i to 1");
	assert!(unparsed.is_empty());
	assert_eq!(unparsed.full(), "State.temporary.i = 1");
}

proptest! {
	#[test]
	fn prop_plain_words_parse_one_argument_each(
		words in prop::collection::vec("[a-zé][a-z0-9é]{0,8}", 0..6),
		separator in prop::sample::select(vec![" ", "\t", "\u{a0}", "\u{2003}", "\u{3000}"]),
	) {
		let raw = words.join(separator);
		let args = parse_args(&raw, &mut ctx()).expect("args");
		prop_assert_eq!(args.len(), words.len());
		for (arg, word) in args.iter().zip(&words) {
			match arg {
				Argument::Text(text) => prop_assert_eq!(text, word),
				Argument::Null | Argument::Undefined | Argument::Bool(_) | Argument::Number(_) => {}
				Argument::Link(_) => prop_assert!(false, "unexpected link"),
			}
		}
	}
}
