//! Literal end-to-end scenarios exercising dedup, batching, conditional
//! fan-out, cache seeding, error propagation, and environment threading.

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use fetchplan::{ast, execute, run, AnyValue, BatchedSource, Cache, CacheKey, DataSource, Env, FetchError, RunOptions, SourceName};

use common::{CountingSource, FailingSource};

#[derive(Clone)]
struct FriendsOf {
    user: u64,
    friend_count: usize,
}

#[async_trait]
impl DataSource for FriendsOf {
    type Identity = u64;
    type Value = Vec<u64>;

    fn source_name(&self) -> SourceName {
        "FriendsOf".into()
    }

    fn identity(&self) -> u64 {
        self.user
    }

    async fn fetch(&self, _env: &Env) -> Result<Vec<u64>, FetchError> {
        Ok((0..self.friend_count as u64).map(|i| 100 + i).collect())
    }
}

#[derive(Clone)]
struct ActivityScore {
    friend: u64,
    batch_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl DataSource for ActivityScore {
    type Identity = u64;
    type Value = u64;

    fn source_name(&self) -> SourceName {
        "ActivityScore".into()
    }

    fn identity(&self) -> u64 {
        self.friend
    }

    async fn fetch(&self, _env: &Env) -> Result<u64, FetchError> {
        Ok(self.friend * 10)
    }
}

#[async_trait]
impl BatchedSource for ActivityScore {
    async fn fetch_multi(sources: &[Self], _env: &Env) -> Result<HashMap<u64, u64>, FetchError> {
        if let Some(first) = sources.first() {
            first.batch_calls.fetch_add(1, Ordering::SeqCst);
        }
        Ok(sources.iter().map(|s| (s.friend, s.friend * 10)).collect())
    }
}

#[derive(Clone)]
struct Pet {
    owner: u64,
}

#[async_trait]
impl DataSource for Pet {
    type Identity = u64;
    type Value = String;

    fn source_name(&self) -> SourceName {
        "Pet".into()
    }

    fn identity(&self) -> u64 {
        self.owner
    }

    async fn fetch(&self, _env: &Env) -> Result<String, FetchError> {
        Ok(format!("pet-of-{}", self.owner))
    }
}

#[derive(Clone)]
struct EchoRegion {
    tag: u64,
}

#[async_trait]
impl DataSource for EchoRegion {
    type Identity = u64;
    type Value = String;

    fn source_name(&self) -> SourceName {
        "EchoRegion".into()
    }

    fn identity(&self) -> u64 {
        self.tag
    }

    async fn fetch(&self, env: &Env) -> Result<String, FetchError> {
        Ok(env.get::<String>().clone())
    }
}

#[async_trait]
impl BatchedSource for EchoRegion {
    async fn fetch_multi(sources: &[Self], env: &Env) -> Result<HashMap<u64, String>, FetchError> {
        let region = env.get::<String>().clone();
        Ok(sources.iter().map(|s| (s.tag, region.clone())).collect())
    }
}

// S1 — a repeated identity inside a `Product` is fetched exactly once.
#[tokio::test]
async fn dedup_inside_a_product() {
    let calls = Arc::new(AtomicUsize::new(0));
    let plan = ast::product(vec![
        ast::source(CountingSource::new(1, &calls)),
        ast::source(CountingSource::new(2, &calls)),
        ast::source(CountingSource::new(2, &calls)),
    ]);

    run(plan, RunOptions::default()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// S2 — an N+1 dependent fan-out (friends, then each friend's score)
// collapses to two dispatch rounds: one for `FriendsOf`, one batched call
// for all five `ActivityScore` lookups.
#[tokio::test]
async fn bind_driven_fan_out_batches_the_second_round() {
    let batch_calls = Arc::new(AtomicUsize::new(0));
    let batch_calls_for_bind = batch_calls.clone();

    let plan = ast::bind(
        move |friends: Vec<u64>| {
            ast::collect(
                friends
                    .into_iter()
                    .map(|friend| {
                        ast::batched_source(ActivityScore {
                            friend,
                            batch_calls: batch_calls_for_bind.clone(),
                        })
                    })
                    .collect(),
            )
        },
        ast::source(FriendsOf {
            user: 1,
            friend_count: 5,
        }),
    );

    let result = run(plan, RunOptions::default()).await.unwrap();
    let scores: Vec<u64> = result
        .downcast::<Vec<AnyValue>>()
        .into_iter()
        .map(AnyValue::downcast::<u64>)
        .collect();

    assert_eq!(scores, vec![1000, 1010, 1020, 1030, 1040]);
    assert_eq!(batch_calls.load(Ordering::SeqCst), 1);
}

// S3 — a `Bind` continuation that branches per element: even friend ids
// fetch a `Pet`, odd ones short-circuit to a literal value.
#[tokio::test]
async fn conditional_fan_out_per_element() {
    let plan = ast::bind(
        |friends: Vec<u64>| {
            ast::collect(
                friends
                    .into_iter()
                    .map(|friend| {
                        if friend % 2 == 0 {
                            ast::source(Pet { owner: friend })
                        } else {
                            ast::value("no pet".to_string())
                        }
                    })
                    .collect(),
            )
        },
        ast::source(FriendsOf {
            user: 1,
            friend_count: 3,
        }),
    );

    let result = run(plan, RunOptions::default()).await.unwrap();
    let pets: Vec<String> = result
        .downcast::<Vec<AnyValue>>()
        .into_iter()
        .map(AnyValue::downcast::<String>)
        .collect();

    assert_eq!(pets, vec!["pet-of-100", "no pet", "pet-of-102"]);
}

// S4 — seeding the cache for an identity elides its fetch entirely.
#[tokio::test]
async fn cache_seed_elides_the_fetch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = CountingSource::new(9, &calls);
    let seed = Cache::seed([(
        source.source_name(),
        CacheKey::new(9u64),
        AnyValue::new(99u64),
    )]);

    let options = RunOptions::builder().cache(seed).build();
    let (value, _) = execute(ast::source(source), options).await.unwrap();

    assert_eq!(value.downcast::<u64>(), 99);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// S5 — one of two concurrently-dispatched sources rejects; the run
// rejects too, even though its sibling would have succeeded.
#[tokio::test]
async fn a_failing_sibling_rejects_the_whole_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let plan = ast::product(vec![
        ast::source(CountingSource::new(1, &calls)),
        ast::source(FailingSource { id: 2 }),
    ]);

    let result = run(plan, RunOptions::default()).await;
    assert!(result.is_err());
    match result.unwrap_err() {
        FetchError::SourceFailed { source_name, .. } => assert_eq!(source_name, "FailingSource"),
        other => panic!("expected SourceFailed, got {other:?}"),
    }
}

// S6 — the environment is threaded unchanged into a batched fetch.
#[tokio::test]
async fn environment_reaches_a_batched_fetch() {
    let options = RunOptions::builder().env("us-east".to_string()).build();
    let plan = ast::product(vec![
        ast::batched_source(EchoRegion { tag: 1 }),
        ast::batched_source(EchoRegion { tag: 2 }),
    ]);

    let (result, _) = execute(plan, options).await.unwrap();
    let regions: Vec<String> = result
        .downcast::<Vec<AnyValue>>()
        .into_iter()
        .map(AnyValue::downcast::<String>)
        .collect();

    assert_eq!(regions, vec!["us-east".to_string(), "us-east".to_string()]);
}

// S7 — a tree built entirely out of already-resolved `Value` nodes
// dispatches nothing and resolves on the first iteration.
#[tokio::test]
async fn an_all_value_product_resolves_without_dispatching() {
    let plan = ast::product(vec![ast::value(1i32), ast::value(2i32), ast::value(3i32)]);
    let result = run(plan, RunOptions::default()).await.unwrap();
    let values: Vec<i32> = result
        .downcast::<Vec<AnyValue>>()
        .into_iter()
        .map(AnyValue::downcast::<i32>)
        .collect();
    assert_eq!(values, vec![1, 2, 3]);
}

// S8 — an empty product resolves to an empty sequence without dispatching.
#[tokio::test]
async fn an_empty_product_resolves_to_an_empty_sequence() {
    let plan = ast::product(Vec::new());
    let result = run(plan, RunOptions::default()).await.unwrap();
    assert!(result.downcast::<Vec<AnyValue>>().is_empty());
}
