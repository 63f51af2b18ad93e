//! Per-invocation macro context.
//!
//! # Role
//!
//! The dispatcher builds one [`MacroContext`] for every macro it runs and
//! hands it to the handler. The context carries the parsed arguments and
//! payload, the output node, an optional debug view, and access to the
//! [`Runtime`] for rendering, evaluation, and scheduling.
//!
//! # Invariants
//!
//! - [`MacroContext::error`] always renders into the raw output node, never
//!   into the debug view.
//! - With debug views disabled, every debug-view helper is a no-op.
//! - Shadowed variable names are valid `$name`/`_name` references.

use std::fmt;
use std::sync::{Arc, LazyLock};

use quire_dom::{DebugModes, DebugView, Document, NodeId, SelectorError};
use quire_invocation::{ArgError, MacroArgs, PayloadBlock};
use quire_primitives::Value;
use quire_registry::MacroDef;
use quire_script::{Scope, ScriptError, State};
use quire_storage::StoreError;
use quire_worker::TaskClass;
use regex::Regex;

use crate::config::Config;
use crate::error_view::append_error;
use crate::runtime::Runtime;
use crate::story::Story;

static VARIABLE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[$_][$A-Z_a-z][$0-9A-Z_a-z]*$").expect("static regex"));

/// Function invoked for each occurrence of a macro.
pub type MacroHandler = fn(&mut MacroContext<'_>) -> MacroResult;

/// A macro definition bound to a runtime handler.
pub type MacroDefinition = MacroDef<MacroHandler>;

/// Result of a handler run.
pub type MacroResult = Result<MacroOutcome, MacroFault>;

/// What a handler did, when it did not fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroOutcome {
	/// The macro performed its effect.
	Applied,
	/// The macro rendered an error through [`MacroContext::error`].
	Failed,
	/// The macro had nothing to do, e.g. an empty body.
	Skipped,
}

/// An unexpected handler failure. The dispatcher renders it as
/// `cannot execute macro <<name>>: MESSAGE`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct MacroFault {
	message: String,
}

impl MacroFault {
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}

impl From<SelectorError> for MacroFault {
	fn from(error: SelectorError) -> Self {
		Self::new(error.to_string())
	}
}

impl From<ArgError> for MacroFault {
	fn from(error: ArgError) -> Self {
		Self::new(error.to_string())
	}
}

impl From<StoreError> for MacroFault {
	fn from(error: StoreError) -> Self {
		Self::new(error.to_string())
	}
}

/// A pending `<<break>>` or `<<continue>>`, consumed by the nearest `<<for>>`.
///
/// While one is pending the renderer stops at the next macro boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopSignal {
	Continue,
	Break,
}

/// Entry in the active context chain.
#[derive(Debug, Clone, Default)]
pub(crate) struct Frame {
	pub(crate) name: String,
	pub(crate) shadows: Vec<String>,
}

/// Handle given to a macro handler for one invocation.
pub struct MacroContext<'rt> {
	rt: &'rt mut Runtime,
	def: Arc<MacroDefinition>,
	name: String,
	display_name: String,
	args: MacroArgs,
	payload: Vec<PayloadBlock>,
	source: String,
	output: NodeId,
	frame: usize,
	debug_enabled: bool,
	debug_view: Option<DebugView>,
}

/// Everything the dispatcher knows about an invocation.
pub(crate) struct Invocation {
	pub(crate) def: Arc<MacroDefinition>,
	pub(crate) name: String,
	pub(crate) display_name: String,
	pub(crate) args: MacroArgs,
	pub(crate) payload: Vec<PayloadBlock>,
	pub(crate) source: String,
	pub(crate) output: NodeId,
	pub(crate) frame: usize,
}

impl<'rt> MacroContext<'rt> {
	pub(crate) fn new(rt: &'rt mut Runtime, invocation: Invocation) -> Self {
		let debug_enabled = rt.config().debug;
		Self {
			rt,
			def: invocation.def,
			name: invocation.name,
			display_name: invocation.display_name,
			args: invocation.args,
			payload: invocation.payload,
			source: invocation.source,
			output: invocation.output,
			frame: invocation.frame,
			debug_enabled,
			debug_view: None,
		}
	}

	/// Canonical macro name. For an alias, the name of the macro it points at.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The name as written in the source.
	pub fn display_name(&self) -> &str {
		&self.display_name
	}

	pub fn args(&self) -> &MacroArgs {
		&self.args
	}

	/// Body blocks; empty for macros without a body.
	pub fn payload(&self) -> &[PayloadBlock] {
		&self.payload
	}

	/// Contents of the first body block, or `""` without a body.
	pub fn contents(&self) -> &str {
		self.payload.first().map_or("", |block| block.contents.as_str())
	}

	/// Source text of the whole invocation.
	pub fn source(&self) -> &str {
		&self.source
	}

	/// The definition being run.
	pub fn def(&self) -> &MacroDefinition {
		&self.def
	}

	/// Per-macro state attached at registration.
	pub fn user_data<T: std::any::Any>(&self) -> Option<&T> {
		self.def.user_data()
	}

	/// Node macro output renders into: the debug view wrapper when debug
	/// views are on, otherwise the dispatcher's output node.
	pub fn output(&mut self) -> NodeId {
		match self.debug_view() {
			Some(view) => view.output(),
			None => self.output,
		}
	}

	/// The dispatcher's output node, bypassing any debug view.
	pub fn raw_output(&self) -> NodeId {
		self.output
	}

	/// The debug view, created on first use. `None` when debug views are off.
	pub fn debug_view(&mut self) -> Option<DebugView> {
		if !self.debug_enabled {
			return None;
		}
		Some(match self.debug_view {
			Some(view) => view,
			None => self.create_debug_view(None, None),
		})
	}

	/// Turns on debug-view modes. No-op when debug views are off.
	pub fn set_debug_modes(&mut self, modes: DebugModes) {
		if let Some(view) = self.debug_view() {
			view.set_modes(&mut self.rt.doc, modes, true);
		}
	}

	/// Creates a debug view in the raw output, replacing any previous one.
	///
	/// Defaults to the display name and the invocation source. Bodied
	/// invocations are marked `nonvoid`.
	pub fn create_debug_view(&mut self, name: Option<&str>, title: Option<&str>) -> DebugView {
		let name = name.unwrap_or(&self.display_name);
		let title = title.unwrap_or(&self.source);
		let view = DebugView::new(&mut self.rt.doc, self.output, "macro", name, title);
		if !self.payload.is_empty() {
			view.set_modes(&mut self.rt.doc, DebugModes::NONVOID, true);
		}
		self.debug_view = Some(view);
		self.debug_enabled = true;
		view
	}

	/// Unwraps the debug view, if any, and stops creating new ones.
	pub fn remove_debug_view(&mut self) {
		if let Some(view) = self.debug_view.take() {
			view.remove(&mut self.rt.doc);
		}
		self.debug_enabled = false;
	}

	/// Renders `<<display_name>>: MESSAGE` as an error view in the raw output.
	pub fn error(&mut self, message: impl fmt::Display) -> MacroResult {
		let message = format!("<<{}>>: {message}", self.display_name);
		append_error(&mut self.rt.doc, self.output, &message, &self.source);
		Ok(MacroOutcome::Failed)
	}

	/// Adds variables to this context's shadow list.
	pub fn add_shadow(&mut self, name: &str) -> Result<(), MacroFault> {
		if !VARIABLE_NAME_RE.is_match(name) {
			return Err(MacroFault::new(format!("invalid variable name \"{name}\"")));
		}
		let shadows = &mut self.rt.frames[self.frame].shadows;
		if !shadows.iter().any(|s| s == name) {
			shadows.push(name.to_owned());
		}
		Ok(())
	}

	/// Variables shadowed by this context.
	pub fn shadows(&self) -> &[String] {
		&self.rt.frames[self.frame].shadows
	}

	/// Variables shadowed by any enclosing context, nearest first.
	pub fn shadow_view(&self) -> Vec<String> {
		let mut view: Vec<String> = Vec::new();
		for frame in self.rt.frames[..self.frame].iter().rev() {
			for name in &frame.shadows {
				if !view.contains(name) {
					view.push(name.clone());
				}
			}
		}
		view
	}

	/// Canonical names of the enclosing macros, nearest first.
	pub fn ancestors(&self) -> impl Iterator<Item = &str> {
		self.rt.frames[..self.frame].iter().rev().map(|frame| frame.name.as_str())
	}

	/// Wraps `callback` so it later runs with the shadowed variables of the
	/// enclosing contexts as they are now, and with this context as the
	/// parent of any macro it renders.
	///
	/// Variables are restored to their values at call time afterwards.
	pub fn shadow_handler<F>(&self, callback: F) -> impl FnOnce(&mut Runtime) + 'static + use<F>
	where
		F: FnOnce(&mut Runtime) + 'static,
	{
		let snapshot: Vec<(String, Value)> = self
			.shadow_view()
			.into_iter()
			.map(|name| {
				let value = self.rt.state.variable(&name);
				(name, value)
			})
			.collect();
		let frames = self.rt.frames[..=self.frame].to_vec();
		shadowed(snapshot, frames, callback)
	}

	/// Schedules `task` after the engine's DOM delay.
	pub fn schedule(&mut self, class: TaskClass, task: impl FnOnce(&mut Runtime) + 'static) {
		let delay = self.rt.config().dom_delay_ms;
		self.rt.tasks.schedule(class, delay, task);
	}

	/// Renders markup into `target`.
	pub fn wiki(&mut self, target: NodeId, text: &str) {
		self.rt.wiki(target, text);
	}

	/// Evaluates script for its value.
	pub fn eval(&mut self, code: &str) -> Result<Value, ScriptError> {
		self.rt.eval(code)
	}

	/// Evaluates script, rendering anything it prints into `target`.
	pub fn eval_into(&mut self, code: &str, target: NodeId) -> Result<Value, ScriptError> {
		self.rt.eval_into(code, target)
	}

	pub fn doc(&self) -> &Document {
		&self.rt.doc
	}

	pub fn doc_mut(&mut self) -> &mut Document {
		&mut self.rt.doc
	}

	pub fn state(&self) -> &State {
		&self.rt.state
	}

	pub fn state_mut(&mut self) -> &mut State {
		&mut self.rt.state
	}

	pub fn story(&self) -> &Story {
		self.rt.story()
	}

	pub fn config(&self) -> &Config {
		self.rt.config()
	}

	/// The whole runtime, for handlers that need more than the helpers above.
	pub fn runtime(&mut self) -> &mut Runtime {
		self.rt
	}
}

/// Runs `callback` with `snapshot` assigned and `frames` as the context
/// chain, then puts both back.
fn shadowed<F>(snapshot: Vec<(String, Value)>, frames: Vec<Frame>, callback: F) -> impl FnOnce(&mut Runtime) + 'static
where
	F: FnOnce(&mut Runtime) + 'static,
{
	move |rt: &mut Runtime| {
		let mut cache = Vec::with_capacity(snapshot.len());
		for (name, value) in snapshot {
			let Some((scope, key)) = Scope::from_sigil(&name) else {
				continue;
			};
			cache.push((scope, key.to_owned(), rt.state.get(scope, key).cloned()));
			rt.state.set(scope, key, value);
		}
		let saved = std::mem::replace(&mut rt.frames, frames);

		callback(rt);

		// The loop that would consume a signal raised here has already finished.
		rt.loop_signal = None;
		rt.frames = saved;
		for (scope, key, previous) in cache {
			match previous {
				Some(value) => rt.state.set(scope, key, value),
				None => {
					rt.state.remove(scope, &key);
				}
			}
		}
	}
}

impl fmt::Debug for MacroContext<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MacroContext")
			.field("name", &self.name)
			.field("display_name", &self.display_name)
			.field("args", &self.args)
			.field("payload", &self.payload.len())
			.field("output", &self.output)
			.field("debug_view", &self.debug_view)
			.finish()
	}
}
