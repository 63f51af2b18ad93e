//! Control macros: `if`, `switch`, and `for` with `break` and `continue`.
//!
//! In debug mode every clause or case gets its own debug view. Clauses that
//! did not run are hidden and marked `invalid`, and a closing view is faked
//! for the end tag.

use std::sync::LazyLock;

use quire_dom::DebugModes;
use quire_invocation::PayloadBlock;
use quire_primitives::{Value, error_message};
use quire_script::Scope;
use regex::Regex;

use crate::context::{LoopSignal, MacroContext, MacroOutcome, MacroResult};

static ELSEIF_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^\s*if\b").expect("static regex"));
static IF_ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^!=&^|<>*/%+\-]=[^=>]").expect("static regex"));
static HAS_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)^\S.*?\s+range\s+\S.*?$").expect("static regex"));
static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"(?s)^(?:State\.(variables|temporary)\.([$A-Z_a-z][$0-9A-Z_a-z]*)\s*,\s*)?State\.(variables|temporary)\.([$A-Z_a-z][$0-9A-Z_a-z]*)\s+range\s+(\S.*?)$",
	)
	.expect("static regex")
});
static THREE_PART_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^([^;]*?)\s*;\s*([^;]*?)\s*;\s*([^;]*?)$").expect("static regex"));
static FOR_IN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^\S+\s+in\s+\S+").expect("static regex"));
static FOR_OF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^\S+\s+of\s+\S+").expect("static regex"));

/// ` (#N)` for every clause but the first.
fn ordinal(index: usize) -> String {
	if index > 0 { format!(" (#{index})") } else { String::new() }
}

/// Adds a view for one clause. Skipped clauses are hidden and invalid.
fn clause_view(ctx: &mut MacroContext<'_>, block: &PayloadBlock, skipped: bool) {
	let view = ctx.create_debug_view(Some(&block.name), Some(&block.source));
	let doc = ctx.doc_mut();
	view.set_modes(doc, DebugModes::NONVOID, false);
	view.set_modes(doc, DebugModes::HIDDEN | DebugModes::INVALID, skipped);
}

/// Adds the remaining clause views and the view standing in for the end tag.
fn close_views(ctx: &mut MacroContext<'_>, rest: &[PayloadBlock], matched: bool) {
	for block in rest {
		clause_view(ctx, block, true);
	}
	let close = format!("/{}", ctx.name());
	let view = ctx.create_debug_view(Some(&close), Some(&format!("<<{close}>>")));
	let doc = ctx.doc_mut();
	view.set_modes(doc, DebugModes::NONVOID, false);
	view.set_modes(doc, DebugModes::HIDDEN | DebugModes::INVALID, !matched);
}

/// `<<if cond>>…[<<elseif cond>>…][<<else>>…]<</if>>`
///
/// Renders the first clause whose condition is truthy, or the `else`
/// clause. Every clause is checked before any condition is evaluated.
pub(super) fn if_(ctx: &mut MacroContext<'_>) -> MacroResult {
	let payload = ctx.payload().to_vec();
	let len = payload.len();
	let assignment_error = ctx.config().macros.if_assignment_error;

	for (i, block) in payload.iter().enumerate() {
		if block.name == "else" {
			let raw = block.args.raw();
			if !raw.is_empty() {
				if ELSEIF_WS_RE.is_match(raw) {
					return ctx.error(format!(
						"whitespace is not allowed between the \"else\" and \"if\" in <<elseif>> clause{}",
						ordinal(i)
					));
				}
				return ctx.error(format!(
					"<<else>> does not accept a conditional expression (perhaps you meant to use <<elseif>>), invalid: {raw}"
				));
			}
			if i + 1 != len {
				return ctx.error("<<else>> must be the final clause");
			}
		} else if block.args.full().is_empty() {
			return ctx.error(format!("no conditional expression specified for <<{}>> clause{}", block.name, ordinal(i)));
		} else if assignment_error && IF_ASSIGN_RE.is_match(block.args.full()) {
			return ctx.error(format!(
				"assignment operator found within <<{}>> clause{} (perhaps you meant to use an equality operator: ==, ===, eq, is), invalid: {}",
				block.name,
				ordinal(i),
				block.args.raw()
			));
		}
	}

	let debug = ctx.config().debug;
	let mut matched = None;
	for (i, block) in payload.iter().enumerate() {
		if debug {
			clause_view(ctx, block, false);
		}
		let passed = block.name == "else"
			|| match ctx.eval(block.args.full()) {
				Ok(value) => value.is_truthy(),
				Err(e) => {
					return ctx.error(format!(
						"bad conditional expression in <<{}>> clause{}: {}",
						if i == 0 { "if" } else { "elseif" },
						ordinal(i),
						error_message(Some(&e))
					));
				}
			};
		if passed {
			let output = ctx.output();
			ctx.wiki(output, &block.contents);
			matched = Some(i);
			break;
		}
		ctx.set_debug_modes(DebugModes::HIDDEN | DebugModes::INVALID);
	}

	if debug {
		let rest = matched.map_or(len, |i| i + 1);
		close_views(ctx, &payload[rest..], matched.is_some());
	}
	Ok(if matched.is_some() { MacroOutcome::Applied } else { MacroOutcome::Skipped })
}

/// `===` on script values. Lists are compared by identity, and two
/// evaluations never share one.
fn strict_equals(left: &Value, right: &Value) -> bool {
	!matches!(left, Value::List(_)) && left == right
}

/// `<<switch expr>><<case value …>>…[<<default>>…]<</switch>>`
///
/// Renders the first case with a value strictly equal to the result, or
/// the `default` case. Text before the first case is ignored.
pub(super) fn switch(ctx: &mut MacroContext<'_>) -> MacroResult {
	if ctx.args().full().is_empty() {
		return ctx.error("no expression specified");
	}
	let payload = ctx.payload().to_vec();
	let len = payload.len();
	if len == 1 {
		return ctx.error("no cases specified");
	}

	for (i, block) in payload.iter().enumerate().skip(1) {
		if block.name == "default" {
			if !block.args.is_empty() {
				return ctx.error(format!("<<default>> does not accept values, invalid: {}", block.args.raw()));
			}
			if i + 1 != len {
				return ctx.error("<<default>> must be the final case");
			}
		} else if block.args.is_empty() {
			return ctx.error(format!("no value(s) specified for <<{}>> (#{i})", block.name));
		}
	}

	let code = ctx.args().full().to_owned();
	let result = match ctx.eval(&code) {
		Ok(value) => value,
		Err(e) => return ctx.error(format!("bad evaluation: {}", error_message(Some(&e)))),
	};

	let switch_view = ctx.debug_view();
	if let Some(view) = switch_view {
		let doc = ctx.doc_mut();
		view.set_modes(doc, DebugModes::NONVOID, false);
		view.set_modes(doc, DebugModes::HIDDEN, true);
	}

	let debug = ctx.config().debug;
	let mut matched = None;
	for (i, block) in payload.iter().enumerate().skip(1) {
		if debug {
			clause_view(ctx, block, false);
		}
		if block.name == "default" || block.args.iter().any(|value| strict_equals(&value.to_value(), &result)) {
			let output = ctx.output();
			ctx.wiki(output, &block.contents);
			matched = Some(i);
			break;
		}
		ctx.set_debug_modes(DebugModes::HIDDEN | DebugModes::INVALID);
	}

	if let Some(view) = switch_view {
		view.set_modes(ctx.doc_mut(), DebugModes::INVALID, matched.is_none());
	}
	if debug {
		let rest = matched.map_or(len, |i| i + 1);
		close_views(ctx, &payload[rest..], matched.is_some());
	}
	Ok(if matched.is_some() { MacroOutcome::Applied } else { MacroOutcome::Skipped })
}

/// A story or temporary variable assigned by the range form.
type LoopVariable = (Scope, String);

fn loop_variable(kind: &str, name: &str) -> LoopVariable {
	let scope = if kind == "temporary" { Scope::Temporary } else { Scope::Story };
	(scope, name.to_owned())
}

/// `<<for>>…<</for>>` in four forms:
///
/// - `<<for>>` loops until a `<<break>>`.
/// - `<<for cond>>` loops while `cond` is truthy.
/// - `<<for init; cond; post>>` as in C. An empty `cond` is `true`.
/// - `<<for [$key,] $value range expr>>` walks a list or the characters of
///   a string.
///
/// Every form but the range form stops with an error after
/// `macros.max_loop_iterations` iterations.
pub(super) fn for_(ctx: &mut MacroContext<'_>) -> MacroResult {
	let args = ctx.args().full().trim().to_owned();
	let contents = ctx.contents();
	let body = contents.strip_suffix('\n').unwrap_or(contents).to_owned();

	if args.is_empty() {
		return run_loop(ctx, &body, None, None, None);
	}

	if HAS_RANGE_RE.is_match(&args) {
		let Some(caps) = RANGE_RE.captures(&args) else {
			return ctx.error("invalid range form syntax, format: [index ,] value range collection");
		};
		let key = caps.get(1).zip(caps.get(2)).map(|(kind, name)| loop_variable(kind.as_str(), name.as_str()));
		let value = loop_variable(&caps[3], &caps[4]);
		return run_range(ctx, &body, key, value, &caps[5]);
	}

	if !args.contains(';') {
		if FOR_IN_RE.is_match(&args) {
			return ctx.error("invalid syntax, for\u{2026}in is not supported; see: for\u{2026}range");
		}
		if FOR_OF_RE.is_match(&args) {
			return ctx.error("invalid syntax, for\u{2026}of is not supported; see: for\u{2026}range");
		}
		return run_loop(ctx, &body, None, Some(args.as_str()), None);
	}

	let Some(caps) = THREE_PART_RE.captures(&args) else {
		return ctx.error("invalid 3-part conditional form syntax, format: [init] ; [condition] ; [post]");
	};
	let non_empty = |text: &str| (!text.is_empty()).then(|| text.to_owned());
	let init = non_empty(&caps[1]);
	let condition = non_empty(caps[2].trim()).unwrap_or_else(|| "true".to_owned());
	let post = non_empty(&caps[3]);
	run_loop(ctx, &body, init.as_deref(), Some(condition.as_str()), post.as_deref())
}

/// Renders one iteration. The first drops a leading newline.
fn render_iteration(ctx: &mut MacroContext<'_>, body: &str, first: bool) {
	let text = if first { body.strip_prefix('\n').unwrap_or(body) } else { body };
	let output = ctx.output();
	ctx.wiki(output, text);
}

/// Consumes a pending signal. Returns `true` on `<<break>>`.
fn take_break(ctx: &mut MacroContext<'_>) -> bool {
	ctx.runtime().loop_signal.take() == Some(LoopSignal::Break)
}

fn run_loop(ctx: &mut MacroContext<'_>, body: &str, init: Option<&str>, condition: Option<&str>, post: Option<&str>) -> MacroResult {
	ctx.set_debug_modes(DebugModes::BLOCK);
	ctx.runtime().loop_signal = None;
	let result = conditional_loop(ctx, body, init, condition, post);
	ctx.runtime().loop_signal = None;
	result
}

fn conditional_loop(ctx: &mut MacroContext<'_>, body: &str, init: Option<&str>, condition: Option<&str>, post: Option<&str>) -> MacroResult {
	let limit = ctx.config().macros.max_loop_iterations;
	if let Some(init) = init
		&& let Err(e) = ctx.eval(init)
	{
		return ctx.error(format!("bad init expression: {}", error_message(Some(&e))));
	}

	let mut iterations = 0u64;
	loop {
		if let Some(condition) = condition {
			match ctx.eval(condition) {
				Ok(value) if value.is_truthy() => {}
				Ok(_) => break,
				Err(e) => return ctx.error(format!("bad conditional expression: {}", error_message(Some(&e)))),
			}
		}
		if iterations == limit {
			return ctx.error(format!("exceeded configured maximum loop iterations ({limit})"));
		}
		iterations += 1;

		render_iteration(ctx, body, iterations == 1);
		if take_break(ctx) {
			break;
		}

		if let Some(post) = post
			&& let Err(e) = ctx.eval(post)
		{
			return ctx.error(format!("bad post expression: {}", error_message(Some(&e))));
		}
	}
	tracing::trace!(iterations, "macro.for");
	Ok(MacroOutcome::Applied)
}

fn run_range(ctx: &mut MacroContext<'_>, body: &str, key: Option<LoopVariable>, value: LoopVariable, expr: &str) -> MacroResult {
	let items = match range_items(ctx, expr) {
		Ok(items) => items,
		Err(message) => return ctx.error(message),
	};

	ctx.set_debug_modes(DebugModes::BLOCK);
	ctx.runtime().loop_signal = None;
	for (i, (item_key, item)) in items.into_iter().enumerate() {
		if let Some((scope, name)) = &key {
			ctx.state_mut().set(*scope, name.as_str(), item_key);
		}
		ctx.state_mut().set(value.0, value.1.as_str(), item);

		render_iteration(ctx, body, i == 0);
		if take_break(ctx) {
			break;
		}
	}
	ctx.runtime().loop_signal = None;
	Ok(MacroOutcome::Applied)
}

/// Key and value pairs of a range: list indices and items, or the UTF-16
/// offsets and characters of a string.
fn range_items(ctx: &mut MacroContext<'_>, expr: &str) -> Result<Vec<(Value, Value)>, String> {
	let value = ctx
		.eval(expr)
		.map_err(|e| format!("bad range expression: {}", error_message(Some(&e))))?;
	match value {
		Value::String(text) => {
			let mut offset = 0usize;
			Ok(text
				.chars()
				.map(|ch| {
					let key = Value::Number(offset as f64);
					offset += ch.len_utf16();
					(key, Value::String(ch.to_string()))
				})
				.collect())
		}
		Value::List(items) => Ok(items
			.into_iter()
			.enumerate()
			.map(|(i, item)| (Value::Number(i as f64), item))
			.collect()),
		other => Err(format!("unsupported range expression type: {}", other.type_of())),
	}
}

/// `<<break>>` and `<<continue>>`: stop the enclosing `<<for>>`, or move on
/// to its next iteration. The rest of the iteration is not rendered.
pub(super) fn break_or_continue(ctx: &mut MacroContext<'_>) -> MacroResult {
	if !ctx.ancestors().any(|name| name == "for") {
		return ctx.error("must only be used in conjunction with its parent macro <<for>>");
	}
	let signal = if ctx.name() == "continue" { LoopSignal::Continue } else { LoopSignal::Break };
	ctx.runtime().loop_signal = Some(signal);
	ctx.set_debug_modes(DebugModes::HIDDEN);
	Ok(MacroOutcome::Applied)
}
