//! Configuration types for the scheduling system.

/// Configuration shared by program lowering, the scheduler and metrics.
#[cfg_attr(feature = "python", pyo3::pyclass(get_all, set_all))]
#[derive(Clone, Debug)]
pub struct SchedulingConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
    /// Tolerance when matching offsets (critical path walk, criticality).
    pub epsilon: f64,
    /// Turn a program's `actors` count into a shared resource that every
    /// timed step consumes one unit of.
    pub enforce_actors: bool,
    /// Resource id used for the actor pool when `enforce_actors` is set.
    pub actor_resource_id: String,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            epsilon: 1e-9,
            enforce_actors: false,
            actor_resource_id: "actors".to_string(),
        }
    }
}

impl SchedulingConfig {
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_actor_limit(mut self) -> Self {
        self.enforce_actors = true;
        self
    }

    /// `a` and `b` are the same offset within `epsilon`.
    #[inline]
    pub fn same_offset(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.epsilon
    }
}
