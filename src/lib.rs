//! # fetchplan
//!
//! A declarative, batching-aware runner for fetch plans built out of five
//! combinators: [`ast::value`], [`ast::source`], [`ast::map`],
//! [`ast::bind`], and [`ast::product`].
//!
//! Application code describes *what* data it needs and how the pieces
//! depend on each other by building an [`Ast`]; `fetchplan` decides *when*
//! to fetch, deduplicating identical requests and batching sibling
//! requests of the same source type wherever the tree's shape allows it.
//!
//! ## Features
//!
//! - A closed five-variant AST: no open trait hierarchy to extend
//! - Automatic deduplication of identical `(source, identity)` requests
//! - Automatic batching for sources that implement [`source::BatchedSource`]
//! - A pluggable [`executor::Executor`] for where fetches actually run
//! - Async/await support with Tokio
//!
//! ## Quick Start
//!
//! ```no_run
//! use async_trait::async_trait;
//! use fetchplan::{ast, run, DataSource, Env, FetchError, SourceName};
//!
//! #[derive(Clone)]
//! struct UserName(u64);
//!
//! #[async_trait]
//! impl DataSource for UserName {
//!     type Identity = u64;
//!     type Value = String;
//!
//!     fn source_name(&self) -> SourceName {
//!         "UserName".into()
//!     }
//!
//!     fn identity(&self) -> u64 {
//!         self.0
//!     }
//!
//!     async fn fetch(&self, _env: &Env) -> Result<String, FetchError> {
//!         Ok(format!("user-{}", self.0))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), FetchError> {
//!     let plan = ast::map(
//!         |name: String| name.to_uppercase(),
//!         ast::source(UserName(42)),
//!     );
//!
//!     let greeting = run(plan, Default::default()).await?;
//!     println!("{}", greeting.downcast::<String>());
//!     Ok(())
//! }
//! ```
//!
//! ## Advanced Usage
//!
//! Seed a run with a warm cache and a custom executor:
//!
//! ```no_run
//! use std::sync::Arc;
//! use fetchplan::{ast, cache_id, execute, resource_name, source, AnyValue, Cache, RunOptions, TokioExecutor};
//! # use fetchplan::{DataSource, Env, FetchError, SourceName};
//! # use async_trait::async_trait;
//! # #[derive(Clone)]
//! # struct UserName(u64);
//! # #[async_trait]
//! # impl DataSource for UserName {
//! #     type Identity = u64;
//! #     type Value = String;
//! #     fn source_name(&self) -> SourceName { "UserName".into() }
//! #     fn identity(&self) -> u64 { self.0 }
//! #     async fn fetch(&self, _env: &Env) -> Result<String, FetchError> { Ok(self.0.to_string()) }
//! # }
//!
//! # async fn example() -> Result<(), FetchError> {
//! let descriptor = source::describe(UserName(42));
//! let cache = Cache::seed([(
//!     resource_name(descriptor.as_ref()),
//!     cache_id(descriptor.as_ref()),
//!     AnyValue::new("cached-name".to_string()),
//! )]);
//!
//! let options = RunOptions::builder()
//!     .cache(cache)
//!     .executor(Arc::new(TokioExecutor::current()))
//!     .build();
//!
//! let (value, final_cache) = execute(ast::source(UserName(42)), options).await?;
//! assert_eq!(value.downcast_ref::<String>(), Some(&"cached-name".to_string()));
//! assert_eq!(final_cache.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// The fetch description tree and its combinators.
pub mod ast;
/// The resolved-value cache threaded through a run.
pub mod cache;
/// The crate's error type.
pub mod error;
/// The pluggable task-scheduling capability.
pub mod executor;
/// Frontier analysis: which sources are ready to fetch right now.
pub mod future;
/// Computes the ready-to-fetch frontier of an `Ast`.
pub mod frontier;
/// Run configuration.
pub mod options;
/// Pure substitution of cached values back into an `Ast`.
pub mod plant;
/// The suspending runner loop.
pub mod runner;
/// The `DataSource`/`BatchedSource` contract and its type-erased form.
pub mod source;
/// Type-erased values and the opaque per-run environment.
pub mod value;

pub use ast::Ast;
pub use cache::Cache;
pub use error::{FetchError, Result};
pub use executor::{Executor, TokioExecutor};
pub use options::{RunOptions, RunOptionsBuilder};
pub use runner::{execute, run, run_blocking};
pub use source::{cache_id, resource_name, BatchedSource, CacheKey, DataSource, ErasedSource, SourceName};
pub use value::{AnyValue, Env};
