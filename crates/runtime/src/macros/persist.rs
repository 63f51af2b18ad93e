use std::sync::LazyLock;

use quire_dom::DebugModes;
use quire_primitives::error_message;
use quire_script::Scope;
use regex::Regex;
use serde_json::{Map, Value as Json};

use crate::context::{MacroContext, MacroOutcome, MacroResult};
use crate::runtime::REMEMBER_KEY;

static STORY_VAR_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"State\.variables\.([$A-Z_a-z][$0-9A-Z_a-z]*)").expect("static regex"));

fn story_variables(full: &str) -> Vec<String> {
	let mut names: Vec<String> = Vec::new();
	for caps in STORY_VAR_RE.captures_iter(full) {
		if !names.iter().any(|n| *n == caps[1]) {
			names.push(caps[1].to_owned());
		}
	}
	names
}

fn remembered(ctx: &mut MacroContext<'_>) -> Option<Map<String, Json>> {
	match ctx.runtime().store()?.get(REMEMBER_KEY) {
		Some(Json::Object(map)) => Some(map),
		_ => Some(Map::new()),
	}
}

/// `<<remember $var to value>>`: sets story variables and keeps them in
/// storage so they survive a restart.
pub(super) fn remember(ctx: &mut MacroContext<'_>) -> MacroResult {
	if ctx.args().full().is_empty() {
		return ctx.error("no expression specified");
	}

	let code = ctx.args().full().to_owned();
	if let Err(e) = ctx.eval(&code) {
		return ctx.error(format!("bad evaluation: {}", error_message(Some(&e))));
	}

	let Some(mut remember) = remembered(ctx) else {
		return ctx.error("no storage is attached");
	};
	for name in story_variables(&code) {
		let value = ctx.state().get(Scope::Story, &name).cloned().unwrap_or_default();
		remember.insert(name, value.to_json());
	}

	let stored = ctx.runtime().store_mut().map(|store| store.set(REMEMBER_KEY, &Json::Object(remember)));
	if !matches!(stored, Some(Ok(true))) {
		if let Some(Err(e)) = &stored {
			tracing::warn!(error = %e, "macro.remember");
		}
		let raw = ctx.args().raw().to_owned();
		return ctx.error(format!("unknown error, cannot remember: {raw}"));
	}
	ctx.set_debug_modes(DebugModes::HIDDEN);
	Ok(MacroOutcome::Applied)
}

/// `<<forget $a, $b>>`: deletes story variables and drops them from storage.
pub(super) fn forget(ctx: &mut MacroContext<'_>) -> MacroResult {
	if ctx.args().full().is_empty() {
		return ctx.error("no story variable list specified");
	}

	let names = story_variables(ctx.args().full());
	let mut remember = remembered(ctx);
	let mut changed = false;
	for name in &names {
		ctx.state_mut().remove(Scope::Story, name);
		if let Some(map) = remember.as_mut()
			&& map.remove(name).is_some()
		{
			changed = true;
		}
	}

	if changed && let Some(map) = remember {
		let stored = ctx.runtime().store_mut().map(|store| {
			if map.is_empty() {
				store.delete(REMEMBER_KEY)
			} else {
				store.set(REMEMBER_KEY, &Json::Object(map))
			}
		});
		if !matches!(stored, Some(Ok(true))) {
			return ctx.error("unknown error, cannot update remember store");
		}
	}
	ctx.set_debug_modes(DebugModes::HIDDEN);
	Ok(MacroOutcome::Applied)
}
