//! Passages and the story that holds them.

use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use quire_primitives::create_slug;
use regex::Regex;
use serde::Deserialize;

use crate::error::StoryError;

static EDGE_NEWLINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\n+|\n+$").expect("static regex"));
static NEWLINE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+").expect("static regex"));

/// Strips leading and trailing newlines and compacts each interior run of
/// newlines into a single space.
pub fn collapse_newlines(text: &str) -> Cow<'_, str> {
	if !text.contains('\n') {
		return Cow::Borrowed(text);
	}
	let trimmed = EDGE_NEWLINES_RE.replace_all(text, "");
	Cow::Owned(NEWLINE_RUN_RE.replace_all(&trimmed, " ").into_owned())
}

/// A named unit of story content.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Passage {
	pub name: String,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub text: String,
}

impl Passage {
	pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			tags: Vec::new(),
			text: text.into(),
		}
	}

	pub fn with_tags<I, S>(mut self, tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.tags = tags.into_iter().map(Into::into).collect();
		self
	}

	pub fn has_tag(&self, tag: &str) -> bool {
		self.tags.iter().any(|t| t == tag)
	}

	/// Element id of the passage when rendered, e.g. `passage-the-end`.
	pub fn dom_id(&self) -> String {
		format!("passage-{}", create_slug(&self.name))
	}

	/// Text ready for the wikifier. Newlines collapse when the passage is
	/// tagged `nobr` or `nobr_all` is set.
	pub fn process_text(&self, nobr_all: bool) -> Cow<'_, str> {
		if nobr_all || self.has_tag("nobr") {
			collapse_newlines(&self.text)
		} else {
			Cow::Borrowed(&self.text)
		}
	}
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StoryFile {
	#[serde(default, rename = "passage")]
	passages: Vec<Passage>,
}

/// Passages by name, in definition order.
#[derive(Debug, Clone, Default)]
pub struct Story {
	passages: IndexMap<String, Passage>,
}

impl Story {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses a story file: a list of `[[passage]]` tables with `name`,
	/// optional `tags`, and `text`.
	pub fn parse(input: &str) -> Result<Self, StoryError> {
		let file: StoryFile = toml::from_str(input)?;
		let mut story = Self::new();
		for passage in file.passages {
			story.insert(passage)?;
		}
		Ok(story)
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self, StoryError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| StoryError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		Self::parse(&content)
	}

	/// Adds a passage. Names are unique and non-empty.
	pub fn insert(&mut self, passage: Passage) -> Result<(), StoryError> {
		if passage.name.is_empty() {
			return Err(StoryError::EmptyName);
		}
		if self.passages.contains_key(&passage.name) {
			return Err(StoryError::Duplicate(passage.name));
		}
		self.passages.insert(passage.name.clone(), passage);
		Ok(())
	}

	/// Builder form of [`Story::insert`] that replaces an existing passage.
	pub fn with_passage(mut self, passage: Passage) -> Self {
		self.passages.insert(passage.name.clone(), passage);
		self
	}

	pub fn has(&self, name: &str) -> bool {
		self.passages.contains_key(name)
	}

	pub fn get(&self, name: &str) -> Option<&Passage> {
		self.passages.get(name)
	}

	pub fn len(&self) -> usize {
		self.passages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.passages.is_empty()
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.passages.keys().map(String::as_str)
	}
}
