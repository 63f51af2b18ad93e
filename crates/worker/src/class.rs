/// Execution classes used for scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Work with observable story effects, such as navigation or a deferred body render.
	Deferred,
	/// Purely visual follow-up work nothing else depends on.
	Cosmetic,
}

impl TaskClass {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Deferred => "deferred",
			Self::Cosmetic => "cosmetic",
		}
	}
}
