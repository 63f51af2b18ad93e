//! Macro dispatch.
//!
//! # Role
//!
//! Turns one macro tag found by the renderer into a handler call: resolve the
//! name, collect the body for bodied macros, parse arguments, run the handler
//! in a fresh [`MacroContext`], and turn failures into error views.
//!
//! # Invariants
//!
//! - Every failure renders exactly one error view and rendering resumes.
//! - Body parsing counts nested openings of the same macro.
//! - Child tags split blocks only at nesting depth one.

use std::sync::Arc;

use quire_dom::NodeId;
use quire_invocation::{MacroArgs, MacroTag, PayloadBlock, parse_args, parse_tag};

use crate::context::{Frame, Invocation, MacroContext, MacroDefinition, MacroFault, MacroOutcome};
use crate::error_view::append_error;
use crate::runtime::Runtime;

/// A body block before argument parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawBlock {
	name: String,
	source: String,
	args: String,
	contents: String,
}

#[derive(Debug, PartialEq, Eq)]
enum BodyError {
	/// No matching closing tag before the end of the source.
	Unclosed,
	/// A closing tag with arguments. Rendering resumes at `resume`.
	Malformed { message: String, resume: usize },
}

/// Collects the blocks of a bodied macro opened by `open`.
///
/// Closing tags are `<</name>>` and `<<endname>>`, where `name` is the name
/// as written. Returns the blocks and the offset just past the closing tag.
fn parse_body(source: &str, open: &MacroTag, children: &[String]) -> Result<(Vec<RawBlock>, usize), BodyError> {
	let close = format!("/{}", open.name);
	let close_alt = format!("end{}", open.name);

	let mut opened = 1usize;
	let mut blocks = Vec::new();
	let mut current = (open.name.clone(), &source[open.start..open.end], open.args.clone());
	let mut content_start = open.end;
	let mut pos = open.end;

	while let Some(offset) = source[pos..].find("<<") {
		let at = pos + offset;
		let Some(tag) = parse_tag(source, at) else {
			pos = at + 2;
			continue;
		};
		pos = tag.end;

		if tag.name == open.name {
			opened += 1;
		} else if tag.name == close || tag.name == close_alt {
			if tag.has_args() {
				return Err(BodyError::Malformed {
					message: format!("malformed closing tag: \"{}\"", &source[tag.start..tag.end]),
					resume: tag.start + 2 + tag.name.len(),
				});
			}
			opened -= 1;
		} else if tag.has_args() && (tag.name.starts_with('/') || tag.name.starts_with("end")) {
			// Foreign closing tag with arguments; resume inside it.
			pos = tag.start + 2 + tag.name.len();
			continue;
		} else if opened == 1 && children.contains(&tag.name) {
			let (name, tag_source, args) = std::mem::replace(&mut current, (tag.name.clone(), &source[tag.start..tag.end], tag.args.clone()));
			blocks.push(RawBlock {
				name,
				source: tag_source.to_owned(),
				args,
				contents: source[content_start..tag.start].to_owned(),
			});
			content_start = tag.end;
		}

		if opened == 0 {
			let (name, tag_source, args) = current;
			blocks.push(RawBlock {
				name,
				source: tag_source.to_owned(),
				args,
				contents: source[content_start..tag.start].to_owned(),
			});
			return Ok((blocks, tag.end));
		}
	}
	Err(BodyError::Unclosed)
}

impl Runtime {
	/// Runs the macro tag `tag` found in `source`, rendering into `output`.
	///
	/// Returns the offset rendering resumes at and what the invocation did.
	pub(crate) fn dispatch_tag(&mut self, output: NodeId, source: &str, tag: &MacroTag) -> (usize, MacroOutcome) {
		let name = tag.name.as_str();
		let tag_source = &source[tag.start..tag.end];

		let Some(resolved) = self.registry.get(name) else {
			let message = match self.registry.tags().get(name) {
				Some(parents) => format!(
					"child tag <<{name}>> was found outside of a call to its parent macro{} <<{}>>",
					if parents.len() == 1 { "" } else { "s" },
					parents.join(">>, <<")
				),
				None => format!("macro <<{name}>> does not exist"),
			};
			append_error(&mut self.doc, output, &message, tag_source);
			return (tag.end, MacroOutcome::Failed);
		};
		let canonical = resolved.name.to_owned();
		let def = Arc::clone(resolved.def);

		let (raw_blocks, end) = if def.has_body() {
			match parse_body(source, tag, def.tags.children()) {
				Ok(body) => body,
				Err(BodyError::Unclosed) => {
					let message = format!("cannot find a closing tag for macro <<{name}>>");
					append_error(&mut self.doc, output, &message, &format!("{tag_source}\u{2026}"));
					return (tag.end, MacroOutcome::Failed);
				}
				Err(BodyError::Malformed { message, resume }) => {
					self.render_fault(output, name, &MacroFault::new(message), &source[tag.start..resume]);
					return (resume, MacroOutcome::Failed);
				}
			}
		} else {
			(Vec::new(), tag.end)
		};
		let invocation_source = &source[tag.start..end];

		let (args, payload) = match self.build_arguments(&def, &canonical, tag, raw_blocks) {
			Ok(parsed) => parsed,
			Err(fault) => {
				self.render_fault(output, name, &fault, invocation_source);
				return (end, MacroOutcome::Failed);
			}
		};

		if self.frames.len() >= self.config.max_nesting {
			let fault = MacroFault::new(format!("maximum nesting depth of {} exceeded", self.config.max_nesting));
			self.render_fault(output, name, &fault, invocation_source);
			return (end, MacroOutcome::Failed);
		}

		tracing::trace!(name, canonical = %canonical, depth = self.frames.len(), "macro.dispatch");
		let frame = self.frames.len();
		self.frames.push(Frame {
			name: canonical.clone(),
			shadows: Vec::new(),
		});
		let handler = def.handler;
		let result = handler(&mut MacroContext::new(
			self,
			Invocation {
				def,
				name: canonical,
				display_name: name.to_owned(),
				args,
				payload,
				source: invocation_source.to_owned(),
				output,
				frame,
			},
		));
		self.frames.truncate(frame);

		match result {
			Ok(outcome) => (end, outcome),
			Err(fault) => {
				self.render_fault(output, name, &fault, invocation_source);
				(end, MacroOutcome::Failed)
			}
		}
	}

	/// Parses the arguments of the opening tag and of every body block.
	fn build_arguments(
		&mut self,
		def: &MacroDefinition,
		canonical: &str,
		tag: &MacroTag,
		raw_blocks: Vec<RawBlock>,
	) -> Result<(MacroArgs, Vec<PayloadBlock>), MacroFault> {
		if raw_blocks.is_empty() {
			let args = self.create_args(&tag.args, def.skip_args.applies_to(canonical))?;
			return Ok((args, Vec::new()));
		}

		let mut payload = Vec::with_capacity(raw_blocks.len());
		for (index, block) in raw_blocks.into_iter().enumerate() {
			let skip = def.skip_args.applies_to(if index == 0 { canonical } else { &block.name });
			payload.push(PayloadBlock {
				args: self.create_args(&block.args, skip)?,
				name: block.name,
				source: block.source,
				contents: block.contents,
			});
		}
		let args = payload[0].args.clone();
		Ok((args, payload))
	}

	fn create_args(&mut self, raw: &str, skip: bool) -> Result<MacroArgs, MacroFault> {
		if skip {
			return Ok(MacroArgs::unparsed(raw));
		}
		Ok(parse_args(raw, self)?)
	}

	fn render_fault(&mut self, output: NodeId, name: &str, fault: &MacroFault, source: &str) {
		let message = format!("cannot execute macro <<{name}>>: {fault}");
		append_error(&mut self.doc, output, &message, source);
	}
}
