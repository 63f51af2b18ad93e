use std::collections::BTreeMap;
use std::fmt;

use crate::TaskClass;

/// A continuation run against the owning context.
pub type Task<C> = Box<dyn FnOnce(&mut C)>;

struct Scheduled<C> {
	class: TaskClass,
	task: Task<C>,
}

/// Delayed tasks ordered by deadline, then by scheduling order.
///
/// Time is virtual: the clock only moves when a driver advances it, so
/// rendering code stays deterministic and tests need no real timers.
pub struct TaskQueue<C> {
	now_ms: u64,
	next_seq: u64,
	pending: BTreeMap<(u64, u64), Scheduled<C>>,
}

impl<C> Default for TaskQueue<C> {
	fn default() -> Self {
		Self {
			now_ms: 0,
			next_seq: 0,
			pending: BTreeMap::new(),
		}
	}
}

impl<C> fmt::Debug for TaskQueue<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TaskQueue")
			.field("now_ms", &self.now_ms)
			.field("pending", &self.pending.len())
			.finish()
	}
}

impl<C> TaskQueue<C> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Current virtual time in milliseconds.
	pub fn now_ms(&self) -> u64 {
		self.now_ms
	}

	/// Schedules `task` to run `delay_ms` after the current virtual time.
	///
	/// Tasks sharing a deadline run in the order they were scheduled.
	pub fn schedule(&mut self, class: TaskClass, delay_ms: u64, task: impl FnOnce(&mut C) + 'static) {
		let deadline = self.now_ms.saturating_add(delay_ms);
		let seq = self.next_seq;
		self.next_seq += 1;
		tracing::trace!(worker_class = class.as_str(), delay_ms, deadline, "worker.schedule");
		self.pending.insert((deadline, seq), Scheduled { class, task: Box::new(task) });
	}

	pub fn len(&self) -> usize {
		self.pending.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}

	/// Number of pending tasks of one class.
	pub fn pending(&self, class: TaskClass) -> usize {
		self.pending.values().filter(|s| s.class == class).count()
	}

	/// Deadline of the earliest pending task.
	pub fn next_deadline(&self) -> Option<u64> {
		self.pending.keys().next().map(|&(deadline, _)| deadline)
	}

	/// Whether the earliest task is due at the current time.
	pub fn has_due(&self) -> bool {
		self.next_deadline().is_some_and(|deadline| deadline <= self.now_ms)
	}

	/// Moves the clock forward. The clock never runs backwards.
	pub(crate) fn set_now(&mut self, now_ms: u64) {
		self.now_ms = self.now_ms.max(now_ms);
	}

	/// Removes the earliest task if it is due.
	pub(crate) fn pop_due(&mut self) -> Option<(TaskClass, Task<C>)> {
		let entry = self.pending.first_entry()?;
		if entry.key().0 > self.now_ms {
			return None;
		}
		let Scheduled { class, task } = entry.remove();
		Some((class, task))
	}
}

/// Contexts that own a [`TaskQueue`] of continuations over themselves.
pub trait HasTaskQueue: Sized {
	fn task_queue(&mut self) -> &mut TaskQueue<Self>;
}
