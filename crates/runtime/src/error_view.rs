//! Inline error views.
//!
//! Every recoverable failure renders as
//!
//! ```html
//! <div class="error-view">
//!   <button class="error-toggle" ...></button>
//!   <span class="error">Error: MESSAGE</span>
//!   <pre class="error-source" aria-hidden="true" hidden="hidden"><code>SOURCE</code></pre>
//! </div>
//! ```
//!
//! The `error` class is the marker aggregating macros scan for.

use std::sync::LazyLock;

use quire_dom::{Document, NodeId};
use regex::Regex;

/// Marker class carried by the message element of every error view.
pub const ERROR_CLASS: &str = "error";

const TITLE: &str = "Error";

static ERROR_PROLOG_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)^(?:(?:uncaught\s+(?:exception:\s+)?)?\w*(?:error|exception|_err):\s+)+").expect("static regex"));

/// Appends an error view for `message` to `output` and returns its wrapper.
///
/// An empty message renders as `unknown error`.
pub fn append_error(doc: &mut Document, output: NodeId, message: &str, source: &str) -> NodeId {
	let message = format!("{TITLE}: {}", if message.is_empty() { "unknown error" } else { message });

	let wrapper = doc.create_element("div");
	doc.add_class(wrapper, "error-view");

	let toggle = doc.create_element("button");
	doc.add_class(toggle, "error-toggle");
	doc.set_attr(toggle, "type", "button");
	doc.set_attr(toggle, "tabindex", "0");
	doc.set_attr(toggle, "aria-label", "Toggle the error view");
	doc.append(wrapper, toggle);

	let text = doc.create_element("span");
	doc.add_class(text, ERROR_CLASS);
	doc.append_text(text, &message);
	doc.append(wrapper, text);

	let pre = doc.create_element("pre");
	doc.add_class(pre, "error-source");
	doc.set_attr(pre, "aria-hidden", "true");
	doc.set_attr(pre, "hidden", "hidden");
	let code = doc.create_element("code");
	doc.append_text(code, source);
	doc.append(pre, code);
	doc.append(wrapper, pre);

	doc.append(output, wrapper);
	tracing::warn!(message = %message, source, "render.error");
	wrapper
}

/// Shows or hides the source block of an error view, as its toggle button does.
pub fn toggle_error_source(doc: &mut Document, wrapper: NodeId) {
	let children = doc.children(wrapper).to_vec();
	let toggle = children.iter().copied().find(|&n| doc.has_class(n, "error-toggle"));
	let source = children.iter().copied().find(|&n| doc.has_class(n, "error-source"));
	let (Some(toggle), Some(source)) = (toggle, source) else {
		return;
	};

	if doc.has_class(toggle, "enabled") {
		doc.remove_class(toggle, "enabled");
		doc.set_attr(source, "aria-hidden", "true");
		doc.set_attr(source, "hidden", "hidden");
	} else {
		doc.add_class(toggle, "enabled");
		doc.remove_attr(source, "aria-hidden");
		doc.remove_attr(source, "hidden");
	}
}

/// Text of every error marker under `scope`, in document order.
pub fn error_texts(doc: &Document, scope: NodeId) -> Vec<String> {
	doc.find_by_class(scope, ERROR_CLASS).into_iter().map(|node| doc.text_content(node)).collect()
}

/// Strips leading `Error: ` style prologs from an error text.
pub fn strip_error_prolog(text: &str) -> &str {
	ERROR_PROLOG_RE.find(text).map_or(text, |m| &text[m.end()..])
}
