//! HTML serialization.

use crate::document::{Document, NodeId, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Returns `true` for elements that never have a closing tag.
pub fn is_void_element(tag: &str) -> bool {
	VOID_ELEMENTS.contains(&tag)
}

fn escape_text(text: &str, out: &mut String) {
	for ch in text.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'\u{a0}' => out.push_str("&nbsp;"),
			_ => out.push(ch),
		}
	}
}

fn escape_attr(value: &str, out: &mut String) {
	for ch in value.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'"' => out.push_str("&quot;"),
			'\u{a0}' => out.push_str("&nbsp;"),
			_ => out.push(ch),
		}
	}
}

impl Document {
	/// Serializes the children of `id`.
	pub fn inner_html(&self, id: NodeId) -> String {
		let mut out = String::new();
		for &child in self.children(id) {
			self.write_node(child, &mut out);
		}
		out
	}

	/// Serializes `id` and its subtree. A fragment serializes as its children.
	pub fn outer_html(&self, id: NodeId) -> String {
		let mut out = String::new();
		self.write_node(id, &mut out);
		out
	}

	fn write_node(&self, id: NodeId, out: &mut String) {
		match self.kind(id) {
			NodeKind::Text(text) => escape_text(text, out),
			NodeKind::Fragment => {
				for &child in self.children(id) {
					self.write_node(child, out);
				}
			}
			NodeKind::Element { tag, attrs } => {
				out.push('<');
				out.push_str(tag);
				for (name, value) in attrs {
					out.push(' ');
					out.push_str(name);
					out.push_str("=\"");
					escape_attr(value, out);
					out.push('"');
				}
				out.push('>');
				if is_void_element(tag) {
					return;
				}
				for &child in self.children(id) {
					self.write_node(child, out);
				}
				out.push_str("</");
				out.push_str(tag);
				out.push('>');
			}
		}
	}
}
