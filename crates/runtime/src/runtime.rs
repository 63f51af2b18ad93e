use quire_dom::{DebugView, Document, NodeId};
use quire_invocation::ArgContext;
use quire_primitives::Value;
use quire_registry::MacroRegistry;
use quire_script::{Interpreter, Scope, ScriptError, State, evaluate};
use quire_storage::Store;
use quire_worker::{DrainBudget, DrainReport, HasTaskQueue, TaskQueue};
use serde_json::Value as Json;

use crate::config::Config;
use crate::context::{Frame, LoopSignal, MacroHandler};
use crate::error::{Result, RuntimeError};
use crate::error_view::{error_texts, strip_error_prolog};
use crate::macros::builtin_registry;
use crate::story::Story;
use crate::wikifier::{RenderSummary, wikify};

/// Storage key holding remembered story variables.
pub const REMEMBER_KEY: &str = "remember";

/// The story engine: document, variable state, macros, and deferred work.
pub struct Runtime {
	pub(crate) config: Config,
	pub(crate) registry: MacroRegistry<MacroHandler>,
	story: Story,
	pub(crate) doc: Document,
	pub(crate) state: State,
	pub(crate) tasks: TaskQueue<Runtime>,
	pub(crate) store: Option<Box<dyn Store>>,
	pub(crate) frames: Vec<Frame>,
	pub(crate) loop_signal: Option<LoopSignal>,
	passages: NodeId,
	history: Vec<String>,
	deferred_errors: Vec<String>,
}

impl Runtime {
	/// Creates a runtime with the built-in macros registered.
	pub fn new(config: Config, story: Story) -> Result<Self> {
		Ok(Self::with_registry(config, story, builtin_registry()?))
	}

	/// Creates a runtime with a caller-assembled macro set.
	pub fn with_registry(config: Config, story: Story, registry: MacroRegistry<MacroHandler>) -> Self {
		let mut doc = Document::new();
		let passages = doc.create_element("div");
		doc.set_attr(passages, "id", "passages");
		let root = doc.root();
		doc.append(root, passages);
		if config.debug {
			DebugView::enable(&mut doc);
		}

		Self {
			config,
			registry,
			story,
			doc,
			state: State::new(),
			tasks: TaskQueue::new(),
			store: None,
			frames: Vec::new(),
			loop_signal: None,
			passages,
			history: Vec::new(),
			deferred_errors: Vec::new(),
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn story(&self) -> &Story {
		&self.story
	}

	pub fn registry(&self) -> &MacroRegistry<MacroHandler> {
		&self.registry
	}

	/// Registry access for adding macros between renders.
	pub fn registry_mut(&mut self) -> &mut MacroRegistry<MacroHandler> {
		&mut self.registry
	}

	pub fn doc(&self) -> &Document {
		&self.doc
	}

	pub fn doc_mut(&mut self) -> &mut Document {
		&mut self.doc
	}

	pub fn state(&self) -> &State {
		&self.state
	}

	pub fn state_mut(&mut self) -> &mut State {
		&mut self.state
	}

	/// Container the active passage is rendered into.
	pub fn passages(&self) -> NodeId {
		self.passages
	}

	/// Names of the passages played so far, oldest first.
	pub fn history(&self) -> &[String] {
		&self.history
	}

	pub fn tasks(&self) -> &TaskQueue<Runtime> {
		&self.tasks
	}

	pub fn store(&self) -> Option<&dyn Store> {
		self.store.as_deref()
	}

	pub fn store_mut(&mut self) -> Option<&mut (dyn Store + 'static)> {
		self.store.as_deref_mut()
	}

	/// Attaches persistent storage and restores remembered story variables.
	///
	/// Returns the number of variables restored.
	pub fn attach_storage(&mut self, store: Box<dyn Store>) -> usize {
		let mut restored = 0;
		if let Some(Json::Object(remember)) = store.get(REMEMBER_KEY) {
			for (name, value) in &remember {
				self.state.set(Scope::Story, name.as_str(), Value::from(value));
				restored += 1;
			}
		}
		tracing::debug!(store = store.name(), id = store.id(), restored, "runtime.storage");
		self.store = Some(store);
		restored
	}

	/// Renders `text` into `output`.
	pub fn wiki(&mut self, output: NodeId, text: &str) -> RenderSummary {
		wikify(self, output, text)
	}

	/// Renders `text` into a discarded fragment and returns the messages of
	/// any errors it produced, prologs stripped.
	pub fn wiki_discard(&mut self, text: &str) -> Vec<String> {
		let fragment = self.doc.create_fragment();
		self.wiki(fragment, text);
		let errors: Vec<String> = error_texts(&self.doc, fragment).iter().map(|text| strip_error_prolog(text).to_owned()).collect();
		self.doc.discard(fragment);
		errors
	}

	/// Evaluates script against the variable state.
	pub fn eval(&mut self, code: &str) -> std::result::Result<Value, ScriptError> {
		evaluate(&mut self.state, code)
	}

	/// Evaluates script, rendering anything it prints into `output`.
	pub fn eval_into(&mut self, code: &str, output: NodeId) -> std::result::Result<Value, ScriptError> {
		let mut printed = String::new();
		let result = Interpreter::new(&mut self.state).with_output(&mut printed).eval(code);
		if !printed.is_empty() {
			self.wiki(output, &printed);
		}
		result
	}

	/// Renders a passage and makes it the active one.
	///
	/// The passage renders detached, then replaces the container's contents.
	/// The previous passage is freed.
	pub fn play(&mut self, name: &str) -> Result<NodeId> {
		let passage = self.story.get(name).ok_or_else(|| RuntimeError::UnknownPassage(name.to_owned()))?;
		let text = passage.process_text(self.config.passages.nobr).into_owned();
		let dom_id = passage.dom_id();
		let tags = passage.tags.join(" ");

		tracing::debug!(passage = name, "runtime.play");
		self.state.clear_temporary();
		self.loop_signal = None;
		self.history.push(name.to_owned());

		let element = self.doc.create_element("div");
		self.doc.set_attr(element, "id", dom_id);
		self.doc.add_class(element, "passage");
		self.doc.set_attr(element, "data-passage", name);
		if !tags.is_empty() {
			self.doc.set_attr(element, "data-tags", tags);
		}

		let summary = self.wiki(element, &text);
		tracing::debug!(passage = name, macros = summary.macros, failed = summary.failed, "runtime.rendered");

		self.doc.empty(self.passages);
		self.doc.append(self.passages, element);
		Ok(element)
	}

	/// Plays the configured start passage.
	pub fn start(&mut self) -> Result<NodeId> {
		let start = self.config.passages.start.clone();
		self.play(&start)
	}

	/// Element of the active passage, if one has been played.
	pub fn active_passage(&self) -> Option<NodeId> {
		self.doc.children(self.passages).first().copied()
	}

	/// Records an error raised by deferred work.
	pub(crate) fn report_deferred_error(&mut self, message: String) {
		tracing::error!(message = %message, "runtime.deferred_error");
		self.deferred_errors.push(message);
	}

	/// Errors raised by deferred work since the last call.
	pub fn take_deferred_errors(&mut self) -> Vec<String> {
		std::mem::take(&mut self.deferred_errors)
	}

	/// Moves the virtual clock forward, running tasks that fall due.
	pub fn advance(&mut self, ms: u64) -> DrainReport {
		quire_worker::advance(self, ms)
	}

	/// Runs deferred work until the queue is empty.
	pub fn run_until_idle(&mut self) -> DrainReport {
		quire_worker::run_until_idle(self, DrainBudget::default())
	}

	/// Runs deferred work on the tokio clock until the queue is empty.
	pub async fn run_realtime(&mut self) -> DrainReport {
		quire_worker::run_realtime(self, DrainBudget::default()).await
	}

	/// Serialized contents of the passage container.
	pub fn html(&self) -> String {
		self.doc.inner_html(self.passages)
	}

	/// Text contents of the passage container.
	pub fn text(&self) -> String {
		self.doc.text_content(self.passages)
	}
}

impl HasTaskQueue for Runtime {
	fn task_queue(&mut self) -> &mut TaskQueue<Self> {
		&mut self.tasks
	}
}

impl ArgContext for Runtime {
	fn variable(&self, name: &str) -> Value {
		self.state.variable(name)
	}

	fn evaluate(&mut self, expr: &str) -> std::result::Result<Value, String> {
		evaluate(&mut self.state, expr).map_err(|e| e.to_string())
	}

	fn has_passage(&self, name: &str) -> bool {
		self.story.has(name)
	}
}

impl std::fmt::Debug for Runtime {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Runtime")
			.field("config", &self.config)
			.field("passages", &self.story.len())
			.field("macros", &self.registry.len())
			.field("tasks", &self.tasks)
			.field("history", &self.history)
			.finish_non_exhaustive()
	}
}
