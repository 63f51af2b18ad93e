use quire_dom::{DebugModes, Document, NodeId, NodeKind};
use quire_worker::TaskClass;

use super::select_targets;
use crate::context::{MacroContext, MacroOutcome, MacroResult};

/// `<<append selector [transition]>>…<</append>>`, and likewise `prepend`
/// and `replace`.
///
/// With `transition` (or `t8n`) the content is wrapped in a span carrying
/// `macro-NAME-insert macro-NAME-in`; the `-in` class is dropped after the
/// DOM delay so stylesheets can animate the change.
pub(super) fn insert(ctx: &mut MacroContext<'_>) -> MacroResult {
	if ctx.args().is_empty() {
		return ctx.error("no selector specified");
	}

	let selector = ctx.args()[0].to_string();
	let Some(targets) = select_targets(ctx, &selector)? else {
		return Ok(MacroOutcome::Failed);
	};
	ctx.set_debug_modes(DebugModes::HIDDEN);

	let name = ctx.name().to_owned();
	let contents = ctx.contents().to_owned();
	if contents.is_empty() {
		if name != "replace" {
			return Ok(MacroOutcome::Skipped);
		}
		for &target in &targets {
			ctx.doc_mut().empty(target);
		}
		return Ok(MacroOutcome::Applied);
	}

	let transition = ctx.args().get(1).is_some_and(|arg| matches!(arg.to_string().as_str(), "transition" | "t8n"));
	let insert = if transition {
		let span = ctx.doc_mut().create_element("span");
		let entering = format!("macro-{name}-in");
		ctx.doc_mut().add_class(span, &format!("macro-{name}-insert {entering}"));
		ctx.schedule(TaskClass::Cosmetic, move |rt| rt.doc_mut().remove_class(span, &entering));
		span
	} else {
		ctx.doc_mut().create_fragment()
	};
	ctx.wiki(insert, &contents);

	let doc = ctx.doc_mut();
	if name == "replace" {
		for &target in &targets {
			doc.empty(target);
		}
	}
	// Every target but the last receives a copy.
	if let Some((&last, rest)) = targets.split_last() {
		for &target in rest {
			let copy = doc.deep_clone(insert);
			place(doc, &name, target, copy);
		}
		place(doc, &name, last, insert);
	}
	Ok(MacroOutcome::Applied)
}

/// Inserts `node` into `target`. A fragment is freed once its children moved.
fn place(doc: &mut Document, name: &str, target: NodeId, node: NodeId) {
	if name == "prepend" {
		doc.prepend(target, node);
	} else {
		doc.append(target, node);
	}
	if matches!(doc.kind(node), NodeKind::Fragment) {
		doc.discard(node);
	}
}

/// `<<remove selector>>`
pub(super) fn remove(ctx: &mut MacroContext<'_>) -> MacroResult {
	if ctx.args().is_empty() {
		return ctx.error("no selector specified");
	}

	let selector = ctx.args()[0].to_string();
	let Some(targets) = select_targets(ctx, &selector)? else {
		return Ok(MacroOutcome::Failed);
	};
	ctx.set_debug_modes(DebugModes::HIDDEN);
	for target in targets {
		ctx.doc_mut().remove(target);
	}
	Ok(MacroOutcome::Applied)
}

/// `<<copy selector>>`: copies the contents of the first match into the output.
pub(super) fn copy(ctx: &mut MacroContext<'_>) -> MacroResult {
	if ctx.args().is_empty() {
		return ctx.error("no selector specified");
	}

	let selector = ctx.args()[0].to_string();
	let Some(targets) = select_targets(ctx, &selector)? else {
		return Ok(MacroOutcome::Failed);
	};
	let output = ctx.output();
	let doc = ctx.doc_mut();
	for child in doc.children(targets[0]).to_vec() {
		let copy = doc.deep_clone(child);
		doc.append(output, copy);
	}
	Ok(MacroOutcome::Applied)
}
