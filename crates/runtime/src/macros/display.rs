use quire_dom::DebugModes;
use quire_primitives::{Value, encode_entities, error_message, string_from};

use crate::context::{MacroContext, MacroFault, MacroOutcome, MacroResult};
use crate::error_view::error_texts;
use crate::story::collapse_newlines;

/// `<<include passage [element]>>`, also reachable as the deprecated `display`.
///
/// With an element name, the passage renders inside a new element tagged
/// with the passage's id class and `data-passage`.
pub(super) fn include(ctx: &mut MacroContext<'_>) -> MacroResult {
	if ctx.display_name() == "display" {
		tracing::warn!(name = "display", replacement = "include", "macro.deprecated");
	}
	if ctx.args().is_empty() {
		return ctx.error("no passage specified");
	}

	let name = ctx.args()[0].passage_name();
	let Some(passage) = ctx.story().get(&name) else {
		return ctx.error(format!("passage \"{name}\" does not exist"));
	};
	let text = passage.process_text(ctx.config().passages.nobr).into_owned();
	let dom_id = passage.dom_id();

	ctx.set_debug_modes(DebugModes::BLOCK);
	let output = ctx.output();
	let target = match ctx.args().get(1) {
		Some(element) if element.to_value().is_truthy() => {
			let tag = element.to_string();
			if !is_element_name(&tag) {
				return Err(MacroFault::new(format!("\"{tag}\" is not a valid element name")));
			}
			let class = format!("{dom_id} macro-{}", ctx.name());
			let doc = ctx.doc_mut();
			let node = doc.create_element(&tag);
			doc.add_class(node, &class);
			doc.set_attr(node, "data-passage", name.as_str());
			doc.append(output, node);
			node
		}
		_ => output,
	};
	ctx.wiki(target, &text);
	Ok(MacroOutcome::Applied)
}

fn is_element_name(tag: &str) -> bool {
	let mut chars = tag.chars();
	chars.next().is_some_and(|c| c.is_ascii_alphabetic()) && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// `<<nobr>>…<</nobr>>`: renders the body with newlines collapsed.
pub(super) fn nobr(ctx: &mut MacroContext<'_>) -> MacroResult {
	let contents = collapse_newlines(ctx.contents()).into_owned();
	let output = ctx.output();
	ctx.wiki(output, &contents);
	Ok(MacroOutcome::Applied)
}

/// `<<print expr>>`, `<<= expr>>`, and `<<- expr>>`.
///
/// The result is rendered as markup; `-` encodes it first so it shows as
/// plain text. A `null` result renders nothing.
pub(super) fn print(ctx: &mut MacroContext<'_>) -> MacroResult {
	if ctx.args().full().is_empty() {
		return ctx.error("no expression specified");
	}

	let code = ctx.args().full().to_owned();
	let value = match ctx.eval(&code) {
		Ok(value) => value,
		Err(e) => return ctx.error(format!("bad evaluation: {}", error_message(Some(&e)))),
	};
	if value == Value::Null {
		return Ok(MacroOutcome::Skipped);
	}

	let text = string_from(&value);
	let text = if ctx.name() == "-" { encode_entities(&text).into_owned() } else { text };
	let output = ctx.output();
	ctx.wiki(output, &text);
	Ok(MacroOutcome::Applied)
}

/// `<<silent>>…<</silent>>`, also reachable as the deprecated `silently`.
///
/// Renders the body out of sight. In debug mode the output is kept in a
/// hidden debug view; otherwise error markers inside it are collected into
/// one error.
pub(super) fn silent(ctx: &mut MacroContext<'_>) -> MacroResult {
	if ctx.display_name() == "silently" {
		tracing::warn!(name = "silently", replacement = "silent", "macro.deprecated");
	}

	let contents = ctx.contents().trim().to_owned();
	let fragment = ctx.doc_mut().create_fragment();
	ctx.wiki(fragment, &contents);

	if ctx.config().debug {
		ctx.set_debug_modes(DebugModes::BLOCK | DebugModes::HIDDEN);
		let output = ctx.output();
		ctx.doc_mut().append(output, fragment);
		ctx.doc_mut().discard(fragment);
		return Ok(MacroOutcome::Applied);
	}

	let errors = error_texts(ctx.doc(), fragment);
	ctx.doc_mut().discard(fragment);
	if errors.is_empty() {
		return Ok(MacroOutcome::Applied);
	}
	ctx.error(format!(
		"error{} within contents ({})",
		if errors.len() == 1 { "" } else { "s" },
		errors.join("; ")
	))
}
