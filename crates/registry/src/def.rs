use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// How a macro's body is delimited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Tags {
	/// No body: the macro is a single self-contained tag.
	#[default]
	Void,
	/// A body terminated by `<</name>>` or `<<endname>>`, with no child tags.
	Body,
	/// A body that may be split into blocks by the listed child tags.
	Children(Vec<String>),
}

impl Tags {
	pub fn has_body(&self) -> bool {
		!matches!(self, Self::Void)
	}

	/// Child tag names, empty unless [`Tags::Children`].
	pub fn children(&self) -> &[String] {
		match self {
			Self::Children(tags) => tags,
			_ => &[],
		}
	}
}

/// Which tags skip argument parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SkipArgs {
	#[default]
	No,
	/// Every tag of the macro receives its arguments unparsed.
	All,
	/// Only the listed tags receive their arguments unparsed.
	Tags(Vec<String>),
}

impl SkipArgs {
	/// Returns `true` if arguments of `tag` must be passed through unparsed.
	pub fn applies_to(&self, tag: &str) -> bool {
		match self {
			Self::No => false,
			Self::All => true,
			Self::Tags(tags) => tags.iter().any(|t| t == tag),
		}
	}
}

/// A macro definition: handler plus parsing options and per-macro state.
pub struct MacroDef<H> {
	/// Function invoked for each occurrence of the macro.
	pub handler: H,
	pub tags: Tags,
	pub skip_args: SkipArgs,
	/// Arbitrary state shared by every invocation of this definition.
	pub user_data: Option<Arc<dyn Any + Send + Sync>>,
}

impl<H> MacroDef<H> {
	/// Creates a body-less definition that parses its arguments.
	pub fn new(handler: H) -> Self {
		Self {
			handler,
			tags: Tags::Void,
			skip_args: SkipArgs::No,
			user_data: None,
		}
	}

	/// Gives the macro a body closed by `<</name>>`.
	pub fn with_body(mut self) -> Self {
		self.tags = Tags::Body;
		self
	}

	/// Gives the macro a body split by the given child tags.
	pub fn with_children<I, S>(mut self, tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.tags = Tags::Children(tags.into_iter().map(Into::into).collect());
		self
	}

	/// Passes every tag's arguments through unparsed.
	pub fn skip_args(mut self) -> Self {
		self.skip_args = SkipArgs::All;
		self
	}

	/// Passes only the listed tags' arguments through unparsed.
	pub fn skip_args_for<I, S>(mut self, tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.skip_args = SkipArgs::Tags(tags.into_iter().map(Into::into).collect());
		self
	}

	pub fn with_user_data<T: Any + Send + Sync>(mut self, data: T) -> Self {
		self.user_data = Some(Arc::new(data));
		self
	}

	/// Borrows the per-macro state as `T`, if present and of that type.
	pub fn user_data<T: Any>(&self) -> Option<&T> {
		self.user_data.as_deref()?.downcast_ref()
	}

	pub fn has_body(&self) -> bool {
		self.tags.has_body()
	}
}

impl<H> fmt::Debug for MacroDef<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MacroDef")
			.field("tags", &self.tags)
			.field("skip_args", &self.skip_args)
			.field("user_data", &self.user_data.is_some())
			.finish_non_exhaustive()
	}
}

/// The second argument of [`crate::MacroRegistry::add`].
pub enum Registration<H> {
	/// A new definition.
	Definition(MacroDef<H>),
	/// An alias of an existing macro, by name.
	AliasOf(String),
}

impl<H> From<MacroDef<H>> for Registration<H> {
	fn from(def: MacroDef<H>) -> Self {
		Self::Definition(def)
	}
}

impl<H> From<&str> for Registration<H> {
	fn from(target: &str) -> Self {
		Self::AliasOf(target.to_owned())
	}
}

impl<H> From<String> for Registration<H> {
	fn from(target: String) -> Self {
		Self::AliasOf(target)
	}
}
