use indexmap::IndexMap;

use crate::selector::{Selector, SelectorError};

/// Arena handle of a node.
///
/// Freeing a node makes its handles stale: reads see an empty detached
/// fragment and writes are ignored, even after the slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
	index: usize,
	generation: u32,
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
	/// Detached container whose children move on insertion.
	Fragment,
	Element { tag: String, attrs: IndexMap<String, String> },
	Text(String),
}

#[derive(Debug, Clone)]
struct Node {
	kind: NodeKind,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

/// What stale handles read.
static VACANT: Node = Node {
	kind: NodeKind::Fragment,
	parent: None,
	children: Vec::new(),
};

#[derive(Debug, Clone)]
struct Slot {
	generation: u32,
	node: Option<Node>,
}

/// An arena-backed document tree rooted at a `body` element.
#[derive(Debug, Clone)]
pub struct Document {
	slots: Vec<Slot>,
	/// Vacant slots, reused before the arena grows.
	free: Vec<usize>,
	root: NodeId,
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl Document {
	/// Creates a document containing only its root element.
	pub fn new() -> Self {
		let mut doc = Self {
			slots: Vec::new(),
			free: Vec::new(),
			root: NodeId { index: 0, generation: 0 },
		};
		doc.root = doc.create_element("body");
		doc
	}

	pub fn root(&self) -> NodeId {
		self.root
	}

	fn alloc(&mut self, kind: NodeKind) -> NodeId {
		let node = Node {
			kind,
			parent: None,
			children: Vec::new(),
		};
		if let Some(index) = self.free.pop() {
			let slot = &mut self.slots[index];
			slot.node = Some(node);
			return NodeId {
				index,
				generation: slot.generation,
			};
		}
		self.slots.push(Slot {
			generation: 0,
			node: Some(node),
		});
		NodeId {
			index: self.slots.len() - 1,
			generation: 0,
		}
	}

	fn node(&self, id: NodeId) -> &Node {
		self.slots
			.get(id.index)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.node.as_ref())
			.unwrap_or(&VACANT)
	}

	fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
		self.slots
			.get_mut(id.index)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.node.as_mut())
	}

	/// Returns `true` while `id` refers to a node that has not been freed.
	pub fn contains(&self, id: NodeId) -> bool {
		self.slots
			.get(id.index)
			.is_some_and(|slot| slot.generation == id.generation && slot.node.is_some())
	}

	/// Number of live nodes, the root included.
	pub fn node_count(&self) -> usize {
		self.slots.iter().filter(|slot| slot.node.is_some()).count()
	}

	/// Number of slots the arena holds, live or vacant.
	pub fn capacity(&self) -> usize {
		self.slots.len()
	}

	/// Detaches `id` and frees it together with its subtree.
	///
	/// The root is never freed. A slot whose generation counter is spent is
	/// retired instead of reused.
	pub fn discard(&mut self, id: NodeId) {
		if id == self.root || !self.contains(id) {
			return;
		}
		self.detach(id);
		let mut stack = vec![id];
		while let Some(node) = stack.pop() {
			let slot = &mut self.slots[node.index];
			if let Some(freed) = slot.node.take() {
				stack.extend(freed.children);
			}
			if let Some(next) = slot.generation.checked_add(1) {
				slot.generation = next;
				self.free.push(node.index);
			}
		}
	}

	/// Creates a detached element. The tag name is lowercased.
	pub fn create_element(&mut self, tag: &str) -> NodeId {
		self.alloc(NodeKind::Element {
			tag: tag.to_ascii_lowercase(),
			attrs: IndexMap::new(),
		})
	}

	/// Creates a detached text node.
	pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
		self.alloc(NodeKind::Text(text.into()))
	}

	/// Creates an empty fragment.
	pub fn create_fragment(&mut self) -> NodeId {
		self.alloc(NodeKind::Fragment)
	}

	pub fn kind(&self, id: NodeId) -> &NodeKind {
		&self.node(id).kind
	}

	/// Tag name of an element, `None` for text and fragments.
	pub fn tag(&self, id: NodeId) -> Option<&str> {
		match &self.node(id).kind {
			NodeKind::Element { tag, .. } => Some(tag),
			_ => None,
		}
	}

	pub fn is_element(&self, id: NodeId) -> bool {
		matches!(self.node(id).kind, NodeKind::Element { .. })
	}

	pub fn parent(&self, id: NodeId) -> Option<NodeId> {
		self.node(id).parent
	}

	pub fn children(&self, id: NodeId) -> &[NodeId] {
		&self.node(id).children
	}

	pub fn has_children(&self, id: NodeId) -> bool {
		!self.node(id).children.is_empty()
	}

	/// Returns `true` if the node is reachable from the root.
	pub fn is_attached(&self, id: NodeId) -> bool {
		self.ancestors_inclusive(id).any(|node| node == self.root)
	}

	fn ancestors_inclusive(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
		std::iter::successors(Some(id), |&node| self.parent(node))
	}

	/// Strict ancestors, nearest first.
	pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
		self.ancestors_inclusive(id).skip(1)
	}

	/// Descendants in document order, excluding `id` itself.
	pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
		let mut out = Vec::new();
		let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
		while let Some(node) = stack.pop() {
			out.push(node);
			stack.extend(self.children(node).iter().rev());
		}
		out
	}

	/// Removes a node from its parent. The subtree stays intact and detached.
	pub fn detach(&mut self, id: NodeId) {
		let Some(parent) = self.node_mut(id).and_then(|node| node.parent.take()) else {
			return;
		};
		if let Some(parent) = self.node_mut(parent) {
			parent.children.retain(|&child| child != id);
		}
	}

	/// Removes a node from the tree for good. See [`Document::discard`].
	pub fn remove(&mut self, id: NodeId) {
		self.discard(id);
	}

	/// Frees every child of `id`.
	pub fn empty(&mut self, id: NodeId) {
		let Some(node) = self.node_mut(id) else {
			return;
		};
		let children = std::mem::take(&mut node.children);
		for child in children {
			self.discard(child);
		}
	}

	fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
		if let Some(node) = self.node_mut(id) {
			node.parent = parent;
		}
	}

	/// Takes the nodes to insert for `child`: a fragment yields its children,
	/// anything else yields itself after detaching.
	fn take_insertable(&mut self, child: NodeId) -> Vec<NodeId> {
		if matches!(self.node(child).kind, NodeKind::Fragment) {
			let children = self.node_mut(child).map(|node| std::mem::take(&mut node.children)).unwrap_or_default();
			for &node in &children {
				self.set_parent(node, None);
			}
			children
		} else {
			self.detach(child);
			vec![child]
		}
	}

	/// Whether `child` may be inserted under `parent`: both are live and
	/// `child` is not `parent` or one of its ancestors.
	fn can_insert(&self, parent: NodeId, child: NodeId) -> bool {
		self.contains(parent) && self.contains(child) && !self.ancestors_inclusive(parent).any(|node| node == child)
	}

	/// Appends `child` as the last child of `parent`.
	///
	/// Inserting a node into its own subtree is ignored.
	pub fn append(&mut self, parent: NodeId, child: NodeId) {
		if !self.can_insert(parent, child) {
			return;
		}
		let nodes = self.take_insertable(child);
		for &node in &nodes {
			self.set_parent(node, Some(parent));
		}
		if let Some(parent) = self.node_mut(parent) {
			parent.children.extend(nodes);
		}
	}

	/// Inserts `child` as the first child of `parent`.
	pub fn prepend(&mut self, parent: NodeId, child: NodeId) {
		if !self.can_insert(parent, child) {
			return;
		}
		let nodes = self.take_insertable(child);
		for &node in &nodes {
			self.set_parent(node, Some(parent));
		}
		if let Some(parent) = self.node_mut(parent) {
			parent.children.splice(0..0, nodes);
		}
	}

	/// Appends a text node, merging with a trailing text sibling.
	pub fn append_text(&mut self, parent: NodeId, text: &str) {
		if text.is_empty() || !self.contains(parent) {
			return;
		}
		if let Some(&last) = self.children(parent).last()
			&& let Some(Node {
				kind: NodeKind::Text(existing),
				..
			}) = self.node_mut(last)
		{
			existing.push_str(text);
			return;
		}
		let node = self.create_text(text);
		self.append(parent, node);
	}

	/// Deep-copies a subtree. The copy is detached.
	pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
		let kind = self.node(id).kind.clone();
		let copy = self.alloc(kind);
		let children = self.children(id).to_vec();
		for child in children {
			let child_copy = self.deep_clone(child);
			self.set_parent(child_copy, Some(copy));
			if let Some(node) = self.node_mut(copy) {
				node.children.push(child_copy);
			}
		}
		copy
	}

	/// Concatenated text of the node and its descendants.
	pub fn text_content(&self, id: NodeId) -> String {
		let mut out = String::new();
		if let NodeKind::Text(text) = &self.node(id).kind {
			out.push_str(text);
		}
		for node in self.descendants(id) {
			if let NodeKind::Text(text) = &self.node(node).kind {
				out.push_str(text);
			}
		}
		out
	}

	pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
		match &self.node(id).kind {
			NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
			_ => None,
		}
	}

	pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
		self.attr(id, name).is_some()
	}

	/// Sets an attribute. Ignored on non-elements.
	pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
		if let Some(Node {
			kind: NodeKind::Element { attrs, .. },
			..
		}) = self.node_mut(id)
		{
			attrs.insert(name.to_ascii_lowercase(), value.into());
		}
	}

	pub fn remove_attr(&mut self, id: NodeId, name: &str) {
		if let Some(Node {
			kind: NodeKind::Element { attrs, .. },
			..
		}) = self.node_mut(id)
		{
			attrs.shift_remove(name);
		}
	}

	/// Class names in attribute order.
	pub fn classes(&self, id: NodeId) -> Vec<&str> {
		self.attr(id, "class").map(|c| c.split_whitespace().collect()).unwrap_or_default()
	}

	pub fn has_class(&self, id: NodeId, name: &str) -> bool {
		self.classes(id).contains(&name)
	}

	fn write_classes(&mut self, id: NodeId, classes: Vec<String>) {
		if classes.is_empty() {
			self.remove_attr(id, "class");
		} else {
			self.set_attr(id, "class", classes.join(" "));
		}
	}

	fn owned_classes(&self, id: NodeId) -> Vec<String> {
		self.classes(id).into_iter().map(str::to_owned).collect()
	}

	/// Adds each whitespace-separated class name not already present.
	pub fn add_class(&mut self, id: NodeId, names: &str) {
		if !self.is_element(id) {
			return;
		}
		let mut classes = self.owned_classes(id);
		for name in names.split_whitespace() {
			if !classes.iter().any(|c| c == name) {
				classes.push(name.to_owned());
			}
		}
		self.write_classes(id, classes);
	}

	/// Removes each whitespace-separated class name.
	pub fn remove_class(&mut self, id: NodeId, names: &str) {
		let remove: Vec<&str> = names.split_whitespace().collect();
		let classes = self.owned_classes(id).into_iter().filter(|c| !remove.contains(&c.as_str())).collect();
		self.write_classes(id, classes);
	}

	/// Removes every class.
	pub fn clear_classes(&mut self, id: NodeId) {
		self.remove_attr(id, "class");
	}

	/// Toggles each whitespace-separated class name.
	pub fn toggle_class(&mut self, id: NodeId, names: &str) {
		if !self.is_element(id) {
			return;
		}
		let mut classes = self.owned_classes(id);
		for name in names.split_whitespace() {
			match classes.iter().position(|c| c == name) {
				Some(index) => {
					classes.remove(index);
				}
				None => classes.push(name.to_owned()),
			}
		}
		self.write_classes(id, classes);
	}

	/// Returns every attached element matching `selector`, in document order.
	pub fn select(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
		let selector = Selector::parse(selector)?;
		let mut matched = Vec::new();
		if selector.matches(self, self.root) {
			matched.push(self.root);
		}
		matched.extend(self.select_in(self.root, &selector));
		Ok(matched)
	}

	/// Returns descendants of `scope` matching a parsed selector.
	pub fn select_in(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
		self.descendants(scope).into_iter().filter(|&node| selector.matches(self, node)).collect()
	}

	/// Returns descendants of `scope` carrying `class`.
	pub fn find_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
		self.descendants(scope).into_iter().filter(|&node| self.has_class(node, class)).collect()
	}
}
