use std::sync::Arc;

use indexmap::IndexMap;
use quire_invocation::is_valid_macro_name;

use crate::def::{MacroDef, Registration};
use crate::error::RegistryError;
use crate::tags::TagIndex;

/// One or more macro names.
pub trait IntoNames {
	fn into_names(self) -> Vec<String>;
}

impl IntoNames for &str {
	fn into_names(self) -> Vec<String> {
		vec![self.to_owned()]
	}
}

impl IntoNames for String {
	fn into_names(self) -> Vec<String> {
		vec![self]
	}
}

impl<const N: usize> IntoNames for [&str; N] {
	fn into_names(self) -> Vec<String> {
		self.iter().map(|s| (*s).to_owned()).collect()
	}
}

impl IntoNames for &[&str] {
	fn into_names(self) -> Vec<String> {
		self.iter().map(|s| (*s).to_owned()).collect()
	}
}

impl IntoNames for Vec<String> {
	fn into_names(self) -> Vec<String> {
		self
	}
}

enum Entry<H> {
	Macro(Arc<MacroDef<H>>),
	/// `target` is the root macro name, never another alias.
	Alias { target: String, def: Arc<MacroDef<H>> },
}

impl<H> Entry<H> {
	fn def(&self) -> &Arc<MacroDef<H>> {
		match self {
			Self::Macro(def) | Self::Alias { def, .. } => def,
		}
	}
}

impl<H> Clone for Entry<H> {
	fn clone(&self) -> Self {
		match self {
			Self::Macro(def) => Self::Macro(Arc::clone(def)),
			Self::Alias { target, def } => Self::Alias {
				target: target.clone(),
				def: Arc::clone(def),
			},
		}
	}
}

/// A macro resolved by name.
#[derive(Debug)]
pub struct Resolved<'a, H> {
	/// Canonical name: the macro itself, or the root macro an alias points at.
	pub name: &'a str,
	pub def: &'a Arc<MacroDef<H>>,
	/// Whether the lookup went through an alias.
	pub is_alias: bool,
}

impl<H> Clone for Resolved<'_, H> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<H> Copy for Resolved<'_, H> {}

/// Name to definition map with aliasing and child-tag tracking.
pub struct MacroRegistry<H> {
	macros: IndexMap<String, Entry<H>>,
	tags: TagIndex,
}

impl<H> Default for MacroRegistry<H> {
	fn default() -> Self {
		Self {
			macros: IndexMap::new(),
			tags: TagIndex::new(),
		}
	}
}

impl<H> Clone for MacroRegistry<H> {
	fn clone(&self) -> Self {
		Self {
			macros: self.macros.clone(),
			tags: self.tags.clone(),
		}
	}
}

impl<H> MacroRegistry<H> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers one or more names against a definition or as an alias.
	///
	/// All names share the same definition. Either every name is registered or,
	/// on error, none is.
	pub fn add(&mut self, names: impl IntoNames, registration: impl Into<Registration<H>>) -> Result<(), RegistryError> {
		let names = names.into_names();
		if names.is_empty() {
			return Err(RegistryError::NoNames);
		}

		let (def, alias_target) = match registration.into() {
			Registration::Definition(def) => (Arc::new(def), None),
			Registration::AliasOf(target) => {
				let resolved = self.get(&target).ok_or_else(|| RegistryError::MissingAliasTarget(target.clone()))?;
				(Arc::clone(resolved.def), Some(resolved.name.to_owned()))
			}
		};

		let mut staged = self.clone();
		for name in &names {
			let entry = match &alias_target {
				Some(target) => Entry::Alias {
					target: target.clone(),
					def: Arc::clone(&def),
				},
				None => Entry::Macro(Arc::clone(&def)),
			};
			staged.insert(name, entry)?;
		}
		*self = staged;
		Ok(())
	}

	fn insert(&mut self, name: &str, entry: Entry<H>) -> Result<(), RegistryError> {
		if !is_valid_macro_name(name) {
			return Err(RegistryError::InvalidName(name.to_owned()));
		}
		if self.macros.contains_key(name) {
			return Err(RegistryError::Clobber(name.to_owned()));
		}
		if let Some(parents) = self.tags.get(name) {
			return Err(RegistryError::ClobberTag {
				tag: name.to_owned(),
				parents: parents.to_vec(),
			});
		}

		let def = entry.def();
		if def.has_body() {
			let tags = TagIndex::tags_for(name, def.tags.children());
			if let Some(tag) = tags.iter().find(|tag| self.macros.contains_key(tag.as_str())) {
				return Err(RegistryError::TagIsMacro { tag: tag.clone() });
			}
			self.tags.register(name, tags);
		}

		tracing::trace!(name, alias = matches!(entry, Entry::Alias { .. }), "macro registered");
		self.macros.insert(name.to_owned(), entry);
		Ok(())
	}

	/// Removes a macro or alias and the tags it owned.
	///
	/// Removing an unknown name is a no-op; naming a child tag is an error.
	/// Aliases of a removed macro keep working.
	pub fn delete(&mut self, name: &str) -> Result<(), RegistryError> {
		if self.macros.shift_remove(name).is_some() {
			self.tags.unregister(name);
			tracing::trace!(name, "macro removed");
			return Ok(());
		}
		if let Some(parents) = self.tags.get(name) {
			return Err(RegistryError::RemoveTag {
				tag: name.to_owned(),
				parents: parents.to_vec(),
			});
		}
		Ok(())
	}

	/// Resolves a name to its definition, following an alias if needed.
	pub fn get(&self, name: &str) -> Option<Resolved<'_, H>> {
		let (key, entry) = self.macros.get_key_value(name)?;
		Some(match entry {
			Entry::Macro(def) => Resolved { name: key, def, is_alias: false },
			Entry::Alias { target, def } => Resolved { name: target, def, is_alias: true },
		})
	}

	pub fn has(&self, name: &str) -> bool {
		self.macros.contains_key(name)
	}

	pub fn is_empty(&self) -> bool {
		self.macros.is_empty()
	}

	pub fn len(&self) -> usize {
		self.macros.len()
	}

	/// Registered names in registration order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.macros.keys().map(String::as_str)
	}

	/// The closing and child tag index.
	pub fn tags(&self) -> &TagIndex {
		&self.tags
	}
}
