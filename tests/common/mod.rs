//! Shared test sources: count invocations so scenarios and property tests
//! can assert on dedup/batching behavior instead of just final values.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use fetchplan::{BatchedSource, DataSource, Env, FetchError, SourceName};

/// A plain (non-batching) source that records how many times `fetch` ran.
#[derive(Clone)]
pub struct CountingSource {
    pub id: u64,
    pub calls: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(id: u64, calls: &Arc<AtomicUsize>) -> Self {
        Self {
            id,
            calls: calls.clone(),
        }
    }
}

#[async_trait]
impl DataSource for CountingSource {
    type Identity = u64;
    type Value = u64;

    fn source_name(&self) -> SourceName {
        "CountingSource".into()
    }

    fn identity(&self) -> u64 {
        self.id
    }

    async fn fetch(&self, _env: &Env) -> Result<u64, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.id * 2)
    }
}

/// A batching source that records both single-fetch and batch-fetch counts.
#[derive(Clone)]
pub struct CountingBatchedSource {
    pub id: u64,
    pub single_calls: Arc<AtomicUsize>,
    pub batch_calls: Arc<AtomicUsize>,
}

impl CountingBatchedSource {
    pub fn new(id: u64, single_calls: &Arc<AtomicUsize>, batch_calls: &Arc<AtomicUsize>) -> Self {
        Self {
            id,
            single_calls: single_calls.clone(),
            batch_calls: batch_calls.clone(),
        }
    }
}

#[async_trait]
impl DataSource for CountingBatchedSource {
    type Identity = u64;
    type Value = u64;

    fn source_name(&self) -> SourceName {
        "CountingBatchedSource".into()
    }

    fn identity(&self) -> u64 {
        self.id
    }

    async fn fetch(&self, _env: &Env) -> Result<u64, FetchError> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.id * 3)
    }
}

#[async_trait]
impl BatchedSource for CountingBatchedSource {
    async fn fetch_multi(sources: &[Self], _env: &Env) -> Result<HashMap<u64, u64>, FetchError> {
        if let Some(first) = sources.first() {
            first.batch_calls.fetch_add(1, Ordering::SeqCst);
        }
        Ok(sources.iter().map(|s| (s.id, s.id * 3)).collect())
    }
}

/// A source whose fetch always rejects, for error-propagation scenarios.
#[derive(Clone)]
pub struct FailingSource {
    pub id: u64,
}

#[async_trait]
impl DataSource for FailingSource {
    type Identity = u64;
    type Value = u64;

    fn source_name(&self) -> SourceName {
        "FailingSource".into()
    }

    fn identity(&self) -> u64 {
        self.id
    }

    async fn fetch(&self, _env: &Env) -> Result<u64, FetchError> {
        Err(FetchError::SourceFailed {
            source_name: self.source_name(),
            identity: format!("{:?}", self.id),
            cause: "simulated upstream failure".into(),
        })
    }
}

/// Drive a future to completion on a fresh, single-use multi-threaded
/// runtime. Kept lazy (callers pass an `async {}` block) so anything that
/// needs `tokio::runtime::Handle::current()` — like `RunOptions::default()`
/// — only runs once already inside the runtime's context.
pub fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Runtime::new()
        .expect("fetchplan tests: failed to start a Tokio runtime")
        .block_on(fut)
}
