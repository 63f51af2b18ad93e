use indexmap::IndexMap;
use quire_primitives::Value;

/// Which variable store a name lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
	/// `$name`, `State.variables.name`: persists across passages.
	Story,
	/// `_name`, `State.temporary.name`: cleared on each passage change.
	Temporary,
}

impl Scope {
	/// Splits a sigiled name such as `$gold` or `_i`.
	pub fn from_sigil(name: &str) -> Option<(Self, &str)> {
		if let Some(rest) = name.strip_prefix('$') {
			Some((Self::Story, rest))
		} else {
			name.strip_prefix('_').map(|rest| (Self::Temporary, rest))
		}
	}

	/// The `State` property holding this store.
	pub fn property(self) -> &'static str {
		match self {
			Self::Story => "variables",
			Self::Temporary => "temporary",
		}
	}

	pub(crate) fn from_property(property: &str) -> Option<Self> {
		match property {
			"variables" => Some(Self::Story),
			"temporary" => Some(Self::Temporary),
			_ => None,
		}
	}
}

/// Story and temporary variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
	variables: IndexMap<String, Value>,
	temporary: IndexMap<String, Value>,
}

impl State {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn store(&self, scope: Scope) -> &IndexMap<String, Value> {
		match scope {
			Scope::Story => &self.variables,
			Scope::Temporary => &self.temporary,
		}
	}

	pub fn store_mut(&mut self, scope: Scope) -> &mut IndexMap<String, Value> {
		match scope {
			Scope::Story => &mut self.variables,
			Scope::Temporary => &mut self.temporary,
		}
	}

	pub fn get(&self, scope: Scope, name: &str) -> Option<&Value> {
		self.store(scope).get(name)
	}

	pub fn set(&mut self, scope: Scope, name: impl Into<String>, value: Value) {
		self.store_mut(scope).insert(name.into(), value);
	}

	/// Removes a variable, returning its last value.
	pub fn remove(&mut self, scope: Scope, name: &str) -> Option<Value> {
		self.store_mut(scope).shift_remove(name)
	}

	/// Looks up a sigiled variable name. Unknown and unsigiled names are `undefined`.
	pub fn variable(&self, name: &str) -> Value {
		Scope::from_sigil(name)
			.and_then(|(scope, name)| self.get(scope, name))
			.cloned()
			.unwrap_or_default()
	}

	pub fn variables(&self) -> &IndexMap<String, Value> {
		&self.variables
	}

	pub fn temporary(&self) -> &IndexMap<String, Value> {
		&self.temporary
	}

	pub fn clear_temporary(&mut self) {
		self.temporary.clear();
	}
}
