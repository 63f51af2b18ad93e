use std::sync::LazyLock;

use quire_dom::DebugModes;
use quire_invocation::desugar;
use quire_primitives::{Value, error_message};
use quire_script::Scope;
use regex::Regex;

use crate::context::{MacroContext, MacroOutcome, MacroResult};

static STATE_REF_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"State\.(variables|temporary)\.([$A-Z_a-z][$0-9A-Z_a-z]*)").expect("static regex"));
static VARIABLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[$_][$A-Z_a-z][$0-9A-Z_a-z]*").expect("static regex"));

/// `<<set expr>>`, also reachable as `run`.
pub(super) fn set(ctx: &mut MacroContext<'_>) -> MacroResult {
	if ctx.args().full().is_empty() {
		return ctx.error("no expression specified");
	}

	let code = ctx.args().full().to_owned();
	if let Err(e) = ctx.eval(&code) {
		return ctx.error(format!("bad evaluation: {}", error_message(Some(&e))));
	}
	ctx.set_debug_modes(DebugModes::HIDDEN);
	Ok(MacroOutcome::Applied)
}

/// `<<unset $a, _b>>`: deletes every variable the argument list names.
pub(super) fn unset(ctx: &mut MacroContext<'_>) -> MacroResult {
	if ctx.args().full().is_empty() {
		return ctx.error("no story/temporary variable list specified");
	}

	let statements: Vec<String> = STATE_REF_RE
		.captures_iter(ctx.args().full())
		.map(|caps| format!("delete State.{}.{}", &caps[1], &caps[2]))
		.collect();
	if statements.is_empty() {
		return Ok(MacroOutcome::Skipped);
	}

	if let Err(e) = ctx.eval(&statements.join("; ")) {
		return ctx.error(format!("bad evaluation: {}", error_message(Some(&e))));
	}
	ctx.set_debug_modes(DebugModes::HIDDEN);
	Ok(MacroOutcome::Applied)
}

/// `<<script [language]>>…<</script>>`
///
/// The body runs as plain script, or desugared first with the `twinescript`
/// language. Anything it prints is rendered in place.
pub(super) fn script(ctx: &mut MacroContext<'_>) -> MacroResult {
	let language = ctx.args().get(0).map_or_else(|| "javascript".to_owned(), ToString::to_string);
	let code = match language.as_str() {
		"javascript" => ctx.contents().to_owned(),
		"twinescript" => desugar(ctx.contents()),
		other => return ctx.error(format!("unknown language \"{other}\"")),
	};

	let fragment = ctx.doc_mut().create_fragment();
	if let Err(e) = ctx.eval_into(&code, fragment) {
		ctx.doc_mut().discard(fragment);
		return ctx.error(format!("bad evaluation: {}", error_message(Some(&e))));
	}

	if ctx.config().debug {
		ctx.create_debug_view(None, None);
	}
	if ctx.doc().has_children(fragment) {
		let output = ctx.output();
		ctx.doc_mut().append(output, fragment);
	}
	ctx.doc_mut().discard(fragment);
	Ok(MacroOutcome::Applied)
}

/// `<<capture $a, _b>>…<</capture>>`
///
/// Renders the body with the listed variables shadowed, so deferred work
/// created inside it sees their values as of this point. The variables are
/// restored afterwards.
pub(super) fn capture(ctx: &mut MacroContext<'_>) -> MacroResult {
	if ctx.args().raw().trim().is_empty() {
		return ctx.error("no story/temporary variable list specified");
	}

	let names: Vec<String> = VARIABLE_RE.find_iter(ctx.args().raw()).map(|m| m.as_str().to_owned()).collect();
	let mut cache: Vec<(Scope, String, Option<Value>)> = Vec::with_capacity(names.len());
	for name in &names {
		let Some((scope, key)) = Scope::from_sigil(name) else {
			continue;
		};
		if !cache.iter().any(|(s, k, _)| *s == scope && k == key) {
			cache.push((scope, key.to_owned(), ctx.state().get(scope, key).cloned()));
		}
		ctx.add_shadow(name)?;
	}

	let contents = ctx.contents().to_owned();
	let output = ctx.output();
	ctx.wiki(output, &contents);

	let state = ctx.state_mut();
	for (scope, key, previous) in cache {
		match previous {
			Some(value) => state.set(scope, key, value),
			None => {
				state.remove(scope, &key);
			}
		}
	}
	Ok(MacroOutcome::Applied)
}
