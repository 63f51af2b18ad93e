use rustc_hash::FxHashMap as HashMap;

/// Maps each closing or child tag to the sorted names of the macros that own it.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
	parents: HashMap<String, Vec<String>>,
}

impl TagIndex {
	pub fn new() -> Self {
		Self::default()
	}

	/// Tags claimed by a bodied macro named `parent`.
	pub(crate) fn tags_for(parent: &str, children: &[String]) -> Vec<String> {
		let mut tags = vec![format!("/{parent}"), format!("end{parent}")];
		tags.extend(children.iter().cloned());
		tags
	}

	/// Records `parent` as an owner of each tag.
	pub(crate) fn register(&mut self, parent: &str, tags: Vec<String>) {
		for tag in tags {
			let parents = self.parents.entry(tag).or_default();
			if !parents.iter().any(|p| p == parent) {
				parents.push(parent.to_owned());
				parents.sort();
			}
		}
	}

	/// Drops `parent` from every tag, forgetting tags left without owners.
	pub(crate) fn unregister(&mut self, parent: &str) {
		self.parents.retain(|_, parents| {
			parents.retain(|p| p != parent);
			!parents.is_empty()
		});
	}

	pub fn has(&self, tag: &str) -> bool {
		self.parents.contains_key(tag)
	}

	/// Sorted parent macro names of `tag`.
	pub fn get(&self, tag: &str) -> Option<&[String]> {
		self.parents.get(tag).map(Vec::as_slice)
	}
}
