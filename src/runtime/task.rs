/// A unit of blocking work the scheduler can move onto a worker thread.
pub trait Task: Send + 'static {
    type Output: Send + 'static;
    fn call(self) -> Self::Output;
}

/// Adapts a closure into a [`Task`].
pub struct TaskWrapper<F> {
    func: F,
}

impl<F, T> TaskWrapper<F>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, T> Task for TaskWrapper<F>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn call(self) -> T {
        (self.func)()
    }
}

#[macro_export]
macro_rules! passgym_task {
    ($func:expr) => {{ $crate::runtime::TaskWrapper::new($func) }};
}
