//! The runner loop: the only place in the crate that
//! suspends. Each iteration extracts the current frontier, dispatches at
//! most one batched or N single fetches per source-name group, joins them
//! concurrently, merges results into the cache, plants, and loops until
//! the tree collapses to a `Value`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::ast::Ast;
use crate::cache::Cache;
use crate::error::FetchError;
use crate::executor::{spawn_on, Executor};
use crate::frontier;
use crate::future::DynFuture;
use crate::options::RunOptions;
use crate::plant::plant_with_expansion;
use crate::source::{CacheKey, ErasedSource, SourceName};
use crate::value::{AnyValue, Env};

/// One group's dispatch outcome, carrying enough to merge into the cache
/// and to detect a malformed batch response.
enum Dispatched {
    Single {
        source_name: SourceName,
        key: CacheKey,
        value: AnyValue,
    },
    Batch {
        source_name: SourceName,
        results: HashMap<CacheKey, AnyValue>,
    },
}

/// Run `ast` to a final value, discarding the cache.
pub fn run(ast: Ast, options: RunOptions) -> DynFuture<Result<AnyValue, FetchError>> {
    Box::pin(async move { execute(ast, options).await.map(|(value, _cache)| value) })
}

/// Run `ast` and block the calling thread until it resolves.
///
/// For synchronous call sites nested inside an existing multi-threaded
/// Tokio runtime (e.g. a blocking trait method that needs to drive a
/// `fetchplan` run to completion). Requires a runtime context, the same
/// as [`tokio::task::block_in_place`].
pub fn run_blocking(ast: Ast, options: RunOptions) -> Result<AnyValue, FetchError> {
    let handle = tokio::runtime::Handle::current();
    tokio::task::block_in_place(move || handle.block_on(run(ast, options)))
}

/// Run `ast` to a final value, returning it alongside the run's final
/// cache.
pub fn execute(ast: Ast, options: RunOptions) -> DynFuture<Result<(AnyValue, Cache), FetchError>> {
    Box::pin(async move {
        let RunOptions {
            env,
            mut cache,
            executor,
        } = options;
        let mut ast = ast;

        loop {
            if ast.is_value() {
                return Ok((ast.into_value(), cache));
            }

            let unresolved_before = ast.reachable_source_count();
            let frontier = frontier::analyze(&ast);
            let groups = frontier.into_groups();

            debug!(groups = groups.len(), "fetchplan: analyzed frontier");

            let mut dispatch_futures: Vec<DynFuture<Result<Dispatched, FetchError>>> = Vec::new();
            let mut dispatched_count = 0usize;

            for (source_name, members) in groups {
                let (_hits, misses): (Vec<_>, Vec<_>) = members
                    .into_iter()
                    .partition(|s| cache.lookup_source(s.as_ref()).is_some());

                if misses.is_empty() {
                    continue;
                }

                dispatched_count += misses.len();

                if misses.len() == 1 {
                    dispatch_futures.push(dispatch_single(
                        misses.into_iter().next().unwrap(),
                        env.clone(),
                        executor.clone(),
                    ));
                    continue;
                }

                match misses[0].fetch_multi_erased(&misses, env.clone()) {
                    Some(batch_future) => {
                        debug!(
                            source_name = %source_name,
                            count = misses.len(),
                            "fetchplan: dispatching batched fetch"
                        );
                        let requested: Vec<CacheKey> =
                            misses.iter().map(|s| s.cache_key()).collect();
                        dispatch_futures.push(dispatch_batch(
                            source_name,
                            requested,
                            batch_future,
                            executor.clone(),
                        ));
                    }
                    None => {
                        debug!(
                            source_name = %source_name,
                            count = misses.len(),
                            "fetchplan: source does not batch, falling back to N single fetches"
                        );
                        for miss in misses {
                            dispatch_futures.push(dispatch_single(miss, env.clone(), executor.clone()));
                        }
                    }
                }
            }

            if dispatched_count > 0 {
                let results = crate::future::all(dispatch_futures).await?;
                for dispatched in results {
                    merge_into_cache(&mut cache, dispatched);
                }
            }

            let (planted, bind_expanded) = plant_with_expansion(ast, &cache);
            let unresolved_after = planted.reachable_source_count();

            if unresolved_before > 0 && !bind_expanded && unresolved_after >= unresolved_before {
                warn!(
                    unresolved_before,
                    unresolved_after, "fetchplan: runner made no progress this iteration"
                );
                return Err(FetchError::NoProgress {
                    unresolved_before,
                    unresolved_after,
                });
            }

            ast = planted;
        }
    })
}

fn dispatch_single(
    source: Box<dyn ErasedSource>,
    env: Env,
    executor: Arc<dyn Executor>,
) -> DynFuture<Result<Dispatched, FetchError>> {
    Box::pin(async move {
        let source_name = source.source_name();
        let key = source.cache_key();
        let value = spawn_on(&executor, async move { source.fetch_erased(env).await }).await??;
        Ok(Dispatched::Single {
            source_name,
            key,
            value,
        })
    })
}

fn dispatch_batch(
    source_name: SourceName,
    requested: Vec<CacheKey>,
    batch_future: DynFuture<Result<HashMap<CacheKey, AnyValue>, FetchError>>,
    executor: Arc<dyn Executor>,
) -> DynFuture<Result<Dispatched, FetchError>> {
    Box::pin(async move {
        let mut results = spawn_on(&executor, batch_future).await??;

        let missing: Vec<String> = requested
            .iter()
            .filter(|key| !results.contains_key(key))
            .map(|key| format!("{key:?}"))
            .collect();
        if !missing.is_empty() {
            return Err(FetchError::MalformedBatch {
                source_name,
                requested: requested.len(),
                missing,
            });
        }

        // Entries for identities nobody asked for are dropped rather than cached.
        results.retain(|key, _| requested.contains(key));

        Ok(Dispatched::Batch {
            source_name,
            results,
        })
    })
}

fn merge_into_cache(cache: &mut Cache, dispatched: Dispatched) {
    match dispatched {
        Dispatched::Single {
            source_name,
            key,
            value,
        } => cache.insert(source_name, key, value),
        Dispatched::Batch {
            source_name,
            results,
        } => {
            for (key, value) in results {
                cache.insert(source_name.clone(), key, value);
            }
        }
    }
}
