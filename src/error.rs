//! Errors surfaced by the runner.
//!
//! Every error the crate produces collapses to a rejection of the
//! top-level run future — there is no local recovery and nothing is
//! retried automatically. `category()`/`is_retriable()` exist for callers
//! who want to decide whether it's worth building a fresh `Ast` and
//! calling `run` again.

use std::fmt;

use thiserror::Error;

use crate::source::SourceName;

/// The error type for all `fetchplan` operations.
#[derive(Error, Debug)]
pub enum FetchError {
    /// A `fetch` or `fetch_multi` call failed.
    #[error("fetch failed for {source_name}:{identity}: {cause}")]
    SourceFailed {
        /// The source type that failed.
        source_name: SourceName,
        /// A debug-formatted identity, for diagnostics.
        identity: String,
        /// The underlying error returned by the `DataSource`.
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    /// `fetch_multi` resolved but its result map didn't cover every
    /// requested identity.
    #[error("batch fetch for {source_name} is missing {} of {requested} identities", missing.len())]
    MalformedBatch {
        /// The source type whose batch response was malformed.
        source_name: SourceName,
        /// How many identities were requested in the batch.
        requested: usize,
        /// Debug-formatted identities present in the request but absent
        /// from the response.
        missing: Vec<String>,
    },

    /// An iteration completed without shrinking the unresolved-source
    /// count and without a `Bind` expanding the tree. Indicates a
    /// misbehaving `DataSource` or a stale cache seed.
    #[error(
        "runner made no progress: {unresolved_before} unresolved source(s) before the \
         iteration, {unresolved_after} after"
    )]
    NoProgress {
        /// Unresolved source count before the iteration.
        unresolved_before: usize,
        /// Unresolved source count after planting.
        unresolved_after: usize,
    },

    /// The configured [`crate::executor::Executor`] failed to run a
    /// scheduled task.
    #[error("executor failed to run a scheduled task: {cause}")]
    ExecutorFailed {
        /// The underlying failure (a panic payload or a closed channel).
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// A coarse classification of [`FetchError`], for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A `DataSource` fetch rejected.
    SourceFailure,
    /// A batch response didn't match its request shape.
    BatchShape,
    /// The runner's progress invariant was violated.
    RunnerInvariant,
    /// The executor itself failed.
    Executor,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SourceFailure => "source-failure",
            Self::BatchShape => "batch-shape",
            Self::RunnerInvariant => "runner-invariant",
            Self::Executor => "executor",
        };
        f.write_str(s)
    }
}

impl FetchError {
    /// Classify this error for logging/metrics.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SourceFailed { .. } => ErrorCategory::SourceFailure,
            Self::MalformedBatch { .. } => ErrorCategory::BatchShape,
            Self::NoProgress { .. } => ErrorCategory::RunnerInvariant,
            Self::ExecutorFailed { .. } => ErrorCategory::Executor,
        }
    }

    /// Whether re-running with a fresh `Ast` could plausibly succeed.
    ///
    /// `fetchplan` never retries on its own behalf; this is
    /// advisory for callers. A `NoProgress` or `MalformedBatch` error
    /// indicates a logic bug in a `DataSource`, not a transient condition,
    /// so those are not considered retriable.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::SourceFailed { .. } | Self::ExecutorFailed { .. })
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, FetchError>;
