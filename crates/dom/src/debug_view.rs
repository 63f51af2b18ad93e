//! Debug-view wrappers that annotate rendered macro output.

use bitflags::bitflags;

use crate::document::{Document, NodeId};

bitflags! {
	/// Presentation modes of a debug view, stored as classes on its wrapper.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct DebugModes: u8 {
		/// Excluded from the normal view, shown only when debugging.
		const HIDDEN = 1 << 0;
		/// Rendered as a block-level annotation.
		const BLOCK = 1 << 1;
		/// The annotated macro had a body.
		const NONVOID = 1 << 2;
		/// A clause or case that did not run.
		const INVALID = 1 << 3;
	}
}

impl DebugModes {
	const CLASSES: [(Self, &'static str); 4] = [
		(Self::HIDDEN, "hidden"),
		(Self::BLOCK, "block"),
		(Self::NONVOID, "nonvoid"),
		(Self::INVALID, "invalid"),
	];
}

/// Attribute set on the root while debug views are displayed.
const ENABLED_ATTR: &str = "data-debug-view";

/// A `<span class="debug">` wrapper plus its trailing `<wbr>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugView {
	parent: NodeId,
	view: NodeId,
	wbr: NodeId,
}

impl DebugView {
	/// Creates the wrapper and appends it, followed by a hidden `<wbr>`, to `parent`.
	pub fn new(doc: &mut Document, parent: NodeId, kind: &str, name: &str, title: &str) -> Self {
		let view = doc.create_element("span");
		doc.set_attr(view, "title", title);
		doc.set_attr(view, "aria-label", title);
		doc.set_attr(view, "data-type", kind);
		doc.set_attr(view, "data-name", name);
		doc.add_class(view, "debug");

		let wbr = doc.create_element("wbr");
		doc.add_class(wbr, "debug hidden");

		doc.append(parent, view);
		doc.append(parent, wbr);
		Self { parent, view, wbr }
	}

	/// The wrapper element that macro output renders into.
	pub fn output(&self) -> NodeId {
		self.view
	}

	/// Current modes, read back from the wrapper's classes.
	pub fn modes(&self, doc: &Document) -> DebugModes {
		DebugModes::CLASSES
			.iter()
			.filter(|(_, class)| doc.has_class(self.view, class))
			.fold(DebugModes::empty(), |acc, (mode, _)| acc | *mode)
	}

	/// Turns the given modes on or off, leaving the rest untouched.
	pub fn set_modes(&self, doc: &mut Document, modes: DebugModes, enabled: bool) {
		for (mode, class) in DebugModes::CLASSES {
			if modes.contains(mode) {
				if enabled {
					doc.add_class(self.view, class);
				} else {
					doc.remove_class(self.view, class);
				}
			}
		}
	}

	/// Unwraps the view: its children move to the parent and both wrapper
	/// elements are removed.
	pub fn remove(&self, doc: &mut Document) {
		let children = doc.children(self.view).to_vec();
		for child in children {
			doc.append(self.parent, child);
		}
		doc.remove(self.view);
		doc.remove(self.wbr);
	}

	/// Whether debug views are currently displayed.
	pub fn is_enabled(doc: &Document) -> bool {
		doc.attr(doc.root(), ENABLED_ATTR) == Some("enabled")
	}

	pub fn enable(doc: &mut Document) {
		let root = doc.root();
		doc.set_attr(root, ENABLED_ATTR, "enabled");
	}

	pub fn disable(doc: &mut Document) {
		let root = doc.root();
		doc.remove_attr(root, ENABLED_ATTR);
	}

	/// Flips the displayed state.
	pub fn toggle(doc: &mut Document) {
		if Self::is_enabled(doc) {
			Self::disable(doc);
		} else {
			Self::enable(doc);
		}
	}
}
