use std::time::Duration;

use futures::future::LocalBoxFuture;

pub trait Scheduler {
    /// Monotonic time since an arbitrary origin.
    fn now(&self) -> Duration;

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;

    /// Resolves on the next animation frame.
    fn next_frame(&self) -> LocalBoxFuture<'static, ()>;

    /// Runs a detached task on the current thread.
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::TokioScheduler;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::time::Duration;

    use futures::future::{FutureExt, LocalBoxFuture};
    use tokio::time::Instant;

    use super::Scheduler;

    /// Tokio-backed scheduler. `spawn` requires a surrounding `LocalSet`.
    #[derive(Debug, Clone)]
    pub struct TokioScheduler {
        origin: Instant,
        frame: Duration,
    }

    impl TokioScheduler {
        pub fn new(frame: Duration) -> Self {
            Self {
                origin: Instant::now(),
                frame,
            }
        }
    }

    impl Default for TokioScheduler {
        fn default() -> Self {
            Self::new(Duration::from_millis(16))
        }
    }

    impl Scheduler for TokioScheduler {
        fn now(&self) -> Duration {
            Instant::now().duration_since(self.origin)
        }

        fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
            tokio::time::sleep(duration).boxed_local()
        }

        fn next_frame(&self) -> LocalBoxFuture<'static, ()> {
            tokio::time::sleep(self.frame).boxed_local()
        }

        fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
            tokio::task::spawn_local(task);
        }
    }
}
