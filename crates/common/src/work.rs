//! Work units executed by load workers

use crate::Result;

/// A single repeatable operation a worker performs per loop iteration.
///
/// Implementations are shared by every worker of a run, so they must not
/// depend on shared mutable state. An `Err` is logged by the worker and the
/// loop carries on.
pub trait WorkUnit: Send + Sync + 'static {
    /// Name used in logs
    fn name(&self) -> &str {
        "work"
    }

    /// Run one iteration
    fn execute(&self) -> Result<()>;
}

/// Work unit backed by a closure
pub struct WorkFn<F> {
    name: String,
    f: F,
}

/// Wrap a closure as a [`WorkUnit`]
pub fn work_fn<F>(name: impl Into<String>, f: F) -> WorkFn<F>
where
    F: Fn() -> Result<()> + Send + Sync + 'static,
{
    WorkFn {
        name: name.into(),
        f,
    }
}

impl<F> WorkUnit for WorkFn<F>
where
    F: Fn() -> Result<()> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> Result<()> {
        (self.f)()
    }
}

impl<F> std::fmt::Debug for WorkFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkFn").field("name", &self.name).finish()
    }
}
