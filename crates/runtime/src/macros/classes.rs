use quire_dom::DebugModes;

use super::select_targets;
use crate::context::{MacroContext, MacroOutcome, MacroResult};

/// `<<addclass selector names>>` and `<<toggleclass selector names>>`.
pub(super) fn add_or_toggle_class(ctx: &mut MacroContext<'_>) -> MacroResult {
	if ctx.args().len() < 2 {
		let mut missing = Vec::new();
		if ctx.args().is_empty() {
			missing.push("selector");
		}
		missing.push("class names");
		return ctx.error(format!("no {} specified", missing.join(" or ")));
	}

	let selector = ctx.args()[0].to_string();
	let names = ctx.args()[1].to_string();
	let names = names.trim();
	let Some(targets) = select_targets(ctx, &selector)? else {
		return Ok(MacroOutcome::Failed);
	};

	ctx.set_debug_modes(DebugModes::HIDDEN);
	let toggle = ctx.name() == "toggleclass";
	let doc = ctx.doc_mut();
	for target in targets {
		if toggle {
			doc.toggle_class(target, names);
		} else {
			doc.add_class(target, names);
		}
	}
	Ok(MacroOutcome::Applied)
}

/// `<<removeclass selector [names]>>`: without names, clears every class.
pub(super) fn remove_class(ctx: &mut MacroContext<'_>) -> MacroResult {
	if ctx.args().is_empty() {
		return ctx.error("no selector specified");
	}

	let selector = ctx.args()[0].to_string();
	let names = ctx.args().get(1).map(|names| names.to_string().trim().to_owned());
	let Some(targets) = select_targets(ctx, &selector)? else {
		return Ok(MacroOutcome::Failed);
	};

	ctx.set_debug_modes(DebugModes::HIDDEN);
	let doc = ctx.doc_mut();
	for target in targets {
		match &names {
			Some(names) => doc.remove_class(target, names),
			None => doc.clear_classes(target),
		}
	}
	Ok(MacroOutcome::Applied)
}
