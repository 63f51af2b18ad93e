use quire_worker::TaskClass;

use crate::context::{MacroContext, MacroOutcome, MacroResult};

/// `<<done>>…<</done>>`: renders the body after the passage is on screen.
///
/// The output is discarded; errors it raises are logged and kept for
/// [`crate::Runtime::take_deferred_errors`].
pub(super) fn done(ctx: &mut MacroContext<'_>) -> MacroResult {
	let contents = ctx.contents().trim().to_owned();
	if contents.is_empty() {
		return Ok(MacroOutcome::Skipped);
	}

	let task = ctx.shadow_handler(move |rt| {
		let errors = rt.wiki_discard(&contents);
		if !errors.is_empty() {
			rt.report_deferred_error(errors.join("; "));
		}
	});
	ctx.schedule(TaskClass::Deferred, task);
	Ok(MacroOutcome::Applied)
}

/// `<<goto passage>>`: plays another passage once the current render is over.
pub(super) fn goto(ctx: &mut MacroContext<'_>) -> MacroResult {
	if ctx.args().is_empty() {
		return ctx.error("no passage specified");
	}

	let name = ctx.args()[0].passage_name();
	if !ctx.story().has(&name) {
		return ctx.error(format!("passage \"{name}\" does not exist"));
	}

	ctx.schedule(TaskClass::Deferred, move |rt| {
		if let Err(e) = rt.play(&name) {
			rt.report_deferred_error(e.to_string());
		}
	});
	Ok(MacroOutcome::Applied)
}
