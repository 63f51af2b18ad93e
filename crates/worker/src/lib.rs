//! Deferred task scheduling.
//!
//! # Role
//!
//! Macros such as `goto` and `done` do not act during the render pass that
//! invokes them. They enqueue a continuation with a fixed delay, and a driver
//! runs it on a later turn. Transition macros enqueue cosmetic class removals
//! the same way.
//!
//! # Invariants
//!
//! - Tasks run in deadline order; equal deadlines run in scheduling order.
//! - Scheduled tasks are never cancelled.
//! - A task may schedule further tasks; drivers pick them up in the same pass
//!   once they are due.

mod class;
mod drive;
mod queue;


pub use class::TaskClass;
pub use drive::{DEFAULT_MAX_TASKS, DrainBudget, DrainReport, advance, drain_due, run_realtime, run_until_idle};
pub use queue::{HasTaskQueue, Task, TaskQueue};
