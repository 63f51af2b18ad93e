use std::time::Duration;

use crate::TaskClass;
use crate::queue::HasTaskQueue;

/// Default cap on tasks executed by one idle run.
pub const DEFAULT_MAX_TASKS: usize = 10_000;

/// Limits for one drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainBudget {
	/// Maximum number of tasks to run before giving up.
	pub max_tasks: usize,
}

impl Default for DrainBudget {
	fn default() -> Self {
		Self {
			max_tasks: DEFAULT_MAX_TASKS,
		}
	}
}

/// Outcome of a drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
	pub deferred: usize,
	pub cosmetic: usize,
	/// Tasks still queued after the pass.
	pub pending: usize,
	/// Virtual time at the end of the pass.
	pub now_ms: u64,
	pub budget_exhausted: bool,
}

impl DrainReport {
	/// Total tasks run.
	pub fn completed(&self) -> usize {
		self.deferred + self.cosmetic
	}

	fn record(&mut self, class: TaskClass) {
		match class {
			TaskClass::Deferred => self.deferred += 1,
			TaskClass::Cosmetic => self.cosmetic += 1,
		}
	}

	fn merge(&mut self, other: Self) {
		self.deferred += other.deferred;
		self.cosmetic += other.cosmetic;
		self.pending = other.pending;
		self.now_ms = other.now_ms;
		self.budget_exhausted |= other.budget_exhausted;
	}
}

fn finish<C: HasTaskQueue>(ctx: &mut C, mut report: DrainReport) -> DrainReport {
	let queue = ctx.task_queue();
	report.pending = queue.len();
	report.now_ms = queue.now_ms();
	report
}

fn drain_with<C: HasTaskQueue>(ctx: &mut C, max_tasks: usize) -> DrainReport {
	let mut report = DrainReport::default();
	while ctx.task_queue().has_due() {
		if report.completed() >= max_tasks {
			report.budget_exhausted = true;
			break;
		}
		let Some((class, task)) = ctx.task_queue().pop_due() else {
			break;
		};
		tracing::trace!(worker_class = class.as_str(), "worker.run");
		task(ctx);
		report.record(class);
	}
	finish(ctx, report)
}

/// Runs every task whose deadline has passed, including tasks that become
/// due while draining. The clock does not move.
pub fn drain_due<C: HasTaskQueue>(ctx: &mut C) -> DrainReport {
	drain_with(ctx, DrainBudget::default().max_tasks)
}

/// Moves the clock forward by `ms`, running tasks in deadline order as their
/// deadlines are reached.
pub fn advance<C: HasTaskQueue>(ctx: &mut C, ms: u64) -> DrainReport {
	let target = ctx.task_queue().now_ms().saturating_add(ms);
	let mut report = DrainReport::default();
	loop {
		let next = ctx.task_queue().next_deadline().filter(|&deadline| deadline <= target);
		let Some(deadline) = next else {
			break;
		};
		ctx.task_queue().set_now(deadline);
		report.merge(drain_with(ctx, DEFAULT_MAX_TASKS.saturating_sub(report.completed())));
		if report.budget_exhausted {
			return finish(ctx, report);
		}
	}
	ctx.task_queue().set_now(target);
	finish(ctx, report)
}

/// Jumps the clock from deadline to deadline until the queue is empty or the
/// budget is spent.
pub fn run_until_idle<C: HasTaskQueue>(ctx: &mut C, budget: DrainBudget) -> DrainReport {
	let mut report = DrainReport::default();
	while let Some(deadline) = ctx.task_queue().next_deadline() {
		let remaining = budget.max_tasks.saturating_sub(report.completed());
		if remaining == 0 {
			report.budget_exhausted = true;
			break;
		}
		ctx.task_queue().set_now(deadline);
		report.merge(drain_with(ctx, remaining));
		if report.budget_exhausted {
			break;
		}
	}
	finish(ctx, report)
}

/// Like [`run_until_idle`], but sleeps on the tokio clock until each deadline.
///
/// Requires a tokio runtime with the time driver enabled.
pub async fn run_realtime<C: HasTaskQueue>(ctx: &mut C, budget: DrainBudget) -> DrainReport {
	let mut report = DrainReport::default();
	while let Some(deadline) = ctx.task_queue().next_deadline() {
		let remaining = budget.max_tasks.saturating_sub(report.completed());
		if remaining == 0 {
			report.budget_exhausted = true;
			break;
		}
		let wait = deadline.saturating_sub(ctx.task_queue().now_ms());
		if wait > 0 {
			tokio::time::sleep(Duration::from_millis(wait)).await;
		}
		ctx.task_queue().set_now(deadline);
		report.merge(drain_with(ctx, remaining));
		if report.budget_exhausted {
			break;
		}
	}
	tracing::debug!(completed = report.completed(), "worker.idle");
	finish(ctx, report)
}
