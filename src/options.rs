//! Run configuration: a plain struct with a fluent builder.

use std::sync::Arc;

use crate::cache::Cache;
use crate::executor::{Executor, TokioExecutor};
use crate::value::Env;

/// Options recognized by [`crate::runner::run`]/[`crate::runner::execute`]:
/// `env`, seed `cache`, and `executor`.
pub struct RunOptions {
    pub(crate) env: Env,
    pub(crate) cache: Cache,
    pub(crate) executor: Arc<dyn Executor>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            env: Env::unit(),
            cache: Cache::new(),
            executor: Arc::new(TokioExecutor::current()),
        }
    }
}

impl RunOptions {
    /// Start building options from the defaults: no env, an empty cache,
    /// and a `TokioExecutor` bound to the current runtime.
    pub fn builder() -> RunOptionsBuilder {
        RunOptionsBuilder::new()
    }
}

/// Fluent builder for [`RunOptions`].
pub struct RunOptionsBuilder {
    env: Env,
    cache: Cache,
    executor: Arc<dyn Executor>,
}

impl RunOptionsBuilder {
    fn new() -> Self {
        let defaults = RunOptions::default();
        Self {
            env: defaults.env,
            cache: defaults.cache,
            executor: defaults.executor,
        }
    }

    /// Set the opaque environment value threaded to every fetch.
    pub fn env<T: Send + Sync + 'static>(mut self, env: T) -> Self {
        self.env = Env::new(env);
        self
    }

    /// Seed the run with a pre-populated cache.
    pub fn cache(mut self, cache: Cache) -> Self {
        self.cache = cache;
        self
    }

    /// Use a custom [`Executor`] instead of the default `TokioExecutor`.
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    /// Finish building.
    pub fn build(self) -> RunOptions {
        RunOptions {
            env: self.env,
            cache: self.cache,
            executor: self.executor,
        }
    }
}
