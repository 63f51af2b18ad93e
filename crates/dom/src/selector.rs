//! CSS selector subset: type, `#id`, `.class`, `[attr]`, `[attr=value]`,
//! `*`, descendant and child combinators, and `,` groups.

use crate::document::{Document, NodeId};

/// Selector parse failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
	#[error("empty selector")]
	Empty,
	#[error("syntax error, unrecognized expression: {0}")]
	Syntax(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
	Descendant,
	Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
	tag: Option<String>,
	id: Option<String>,
	classes: Vec<String>,
	attrs: Vec<(String, Option<String>)>,
}

impl Compound {
	fn is_empty(&self) -> bool {
		self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
	}

	fn matches(&self, doc: &Document, node: NodeId) -> bool {
		let Some(tag) = doc.tag(node) else {
			return false;
		};
		if self.tag.as_deref().is_some_and(|want| want != "*" && want != tag) {
			return false;
		}
		if self.id.as_deref().is_some_and(|want| doc.attr(node, "id") != Some(want)) {
			return false;
		}
		if !self.classes.iter().all(|class| doc.has_class(node, class)) {
			return false;
		}
		self.attrs.iter().all(|(name, value)| match value {
			Some(value) => doc.attr(node, name) == Some(value.as_str()),
			None => doc.has_attr(node, name),
		})
	}
}

/// A chain of compounds read left to right; the last compound is the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
	head: Compound,
	tail: Vec<(Combinator, Compound)>,
}

impl Complex {
	fn matches(&self, doc: &Document, node: NodeId) -> bool {
		let mut parts: Vec<(Option<Combinator>, &Compound)> = vec![(None, &self.head)];
		parts.extend(self.tail.iter().map(|(comb, compound)| (Some(*comb), compound)));
		match_from(doc, node, &parts)
	}
}

/// Matches `parts` right to left, with `node` as the subject of the last part.
fn match_from(doc: &Document, node: NodeId, parts: &[(Option<Combinator>, &Compound)]) -> bool {
	let Some(((combinator, compound), rest)) = parts.split_last() else {
		return true;
	};
	if !compound.matches(doc, node) {
		return false;
	}
	match combinator {
		None => true,
		Some(Combinator::Child) => doc.parent(node).is_some_and(|parent| match_from(doc, parent, rest)),
		Some(Combinator::Descendant) => doc.ancestors(node).any(|ancestor| match_from(doc, ancestor, rest)),
	}
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
	groups: Vec<Complex>,
}

impl Selector {
	/// Parses a selector list.
	pub fn parse(input: &str) -> Result<Self, SelectorError> {
		if input.trim().is_empty() {
			return Err(SelectorError::Empty);
		}
		let groups = input.split(',').map(|group| parse_complex(group, input)).collect::<Result<_, _>>()?;
		Ok(Self { groups })
	}

	/// Returns `true` if any group matches `node`.
	pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
		self.groups.iter().any(|group| group.matches(doc, node))
	}
}

fn is_ident_char(ch: char) -> bool {
	ch.is_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii()
}

fn parse_complex(group: &str, full: &str) -> Result<Complex, SelectorError> {
	let syntax = || SelectorError::Syntax(full.to_owned());
	let mut chars = group.trim().chars().peekable();
	let mut compounds: Vec<(Option<Combinator>, Compound)> = Vec::new();
	let mut pending: Option<Combinator> = None;

	while chars.peek().is_some() {
		let mut saw_space = false;
		while chars.peek().is_some_and(|c| c.is_whitespace()) {
			chars.next();
			saw_space = true;
		}
		if chars.peek() == Some(&'>') {
			chars.next();
			pending = Some(Combinator::Child);
			while chars.peek().is_some_and(|c| c.is_whitespace()) {
				chars.next();
			}
		} else if saw_space && !compounds.is_empty() {
			pending = Some(Combinator::Descendant);
		}

		let compound = parse_compound(&mut chars).ok_or_else(syntax)?;
		if compounds.is_empty() && pending.is_some() {
			return Err(syntax());
		}
		compounds.push((pending.take(), compound));
	}

	if pending.is_some() {
		return Err(syntax());
	}
	let mut iter = compounds.into_iter();
	let (_, head) = iter.next().ok_or_else(syntax)?;
	let tail = iter.map(|(comb, compound)| (comb.unwrap_or(Combinator::Descendant), compound)).collect();
	Ok(Complex { head, tail })
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
	let mut ident = String::new();
	while let Some(&ch) = chars.peek()
		&& is_ident_char(ch)
	{
		ident.push(ch);
		chars.next();
	}
	ident
}

fn parse_compound(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<Compound> {
	let mut compound = Compound::default();

	if chars.peek() == Some(&'*') {
		chars.next();
		compound.tag = Some("*".into());
	} else if chars.peek().is_some_and(|&c| is_ident_char(c)) {
		compound.tag = Some(take_ident(chars).to_ascii_lowercase());
	}

	loop {
		match chars.peek() {
			Some('#') => {
				chars.next();
				let ident = take_ident(chars);
				if ident.is_empty() {
					return None;
				}
				compound.id = Some(ident);
			}
			Some('.') => {
				chars.next();
				let ident = take_ident(chars);
				if ident.is_empty() {
					return None;
				}
				compound.classes.push(ident);
			}
			Some('[') => {
				chars.next();
				compound.attrs.push(parse_attr(chars)?);
			}
			Some(c) if c.is_whitespace() || *c == '>' => break,
			None => break,
			Some(_) => return None,
		}
	}

	(!compound.is_empty()).then_some(compound)
}

fn parse_attr(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<(String, Option<String>)> {
	let name = take_ident(chars).to_ascii_lowercase();
	if name.is_empty() {
		return None;
	}
	match chars.next()? {
		']' => Some((name, None)),
		'=' => {
			let value: String = match chars.peek() {
				Some(&quote) if quote == '"' || quote == '\'' => {
					chars.next();
					chars.by_ref().take_while(|&c| c != quote).collect()
				}
				_ => take_ident(chars),
			};
			(chars.next()? == ']').then_some((name, Some(value)))
		}
		_ => None,
	}
}
