//! The executor abstraction.
//!
//! The runner has no preference for how a scheduled fetch actually runs —
//! only that `execute(task)` eventually runs it. The default wraps a Tokio
//! runtime handle; callers may substitute anything implementing
//! [`Executor`].

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tracing::warn;

use crate::error::FetchError;

/// A single-method scheduling capability.
///
/// `execute` must eventually run `task`; the runner does not observe when
/// or on which thread.
pub trait Executor: Send + Sync {
    /// Schedule `task` to run to completion.
    fn execute(&self, task: BoxFuture<'static, ()>);
}

/// The default executor: spawns onto a Tokio runtime handle.
#[derive(Clone)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

impl TokioExecutor {
    /// Wrap an explicit runtime handle.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Wrap the handle of the runtime the caller is currently running on.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime context, same as
    /// `tokio::runtime::Handle::current()`.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl Executor for TokioExecutor {
    fn execute(&self, task: BoxFuture<'static, ()>) {
        self.handle.spawn(task);
    }
}

impl From<tokio::runtime::Handle> for TokioExecutor {
    fn from(handle: tokio::runtime::Handle) -> Self {
        Self::new(handle)
    }
}

/// Run a future to completion on `executor`, surfacing an
/// [`FetchError::ExecutorFailed`] if the task panics or is dropped before
/// it resolves.
pub(crate) async fn spawn_on<T, F>(executor: &Arc<dyn Executor>, future: F) -> Result<T, FetchError>
where
    T: Send + 'static,
    F: std::future::Future<Output = T> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    executor.execute(Box::pin(async move {
        let result = future.await;
        if tx.send(result).is_err() {
            warn!("fetchplan: executor task's result channel was dropped before completion");
        }
    }));
    rx.await.map_err(|_| FetchError::ExecutorFailed {
        cause: "scheduled task was dropped before completing".into(),
    })
}
