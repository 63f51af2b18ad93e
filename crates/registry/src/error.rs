/// Registration errors.
///
/// These are configuration mistakes in startup code, not runtime conditions;
/// callers typically abort initialization on them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	#[error("no macro names specified")]
	NoNames,
	#[error("invalid macro name \"{0}\"")]
	InvalidName(String),
	#[error("cannot clobber existing macro <<{0}>>")]
	Clobber(String),
	#[error("cannot clobber child tag <<{tag}>> of parent macro{} <<{}>>", plural(.parents), .parents.join(">>, <<"))]
	ClobberTag { tag: String, parents: Vec<String> },
	#[error("cannot create alias of nonexistent macro <<{0}>>")]
	MissingAliasTarget(String),
	#[error("cannot register tag <<{tag}>> for an existing macro")]
	TagIsMacro { tag: String },
	#[error("cannot remove child tag <<{tag}>> of parent macro{} <<{}>>", plural(.parents), .parents.join(">>, <<"))]
	RemoveTag { tag: String, parents: Vec<String> },
}

fn plural(items: &[String]) -> &'static str {
	if items.len() == 1 { "" } else { "s" }
}
