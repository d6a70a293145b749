//! Thin adapter over the host future primitive.
//!
//! The runner needs a composable asynchronous result type supporting
//! `resolved(v)`, `rejected(e)`, `map`, `then`, and an `all`-join over a
//! vector. In Rust that primitive is `std::future::Future` plus the
//! `futures` crate's combinators; this module gives the rest of the crate
//! one small, named vocabulary instead of spreading raw `futures` calls
//! through the runner.

use futures::future::BoxFuture;
use futures::FutureExt;

/// A boxed, owned future — the concrete shape every public `fetchplan`
/// async operation returns.
pub type DynFuture<T> = BoxFuture<'static, T>;

/// `resolved(v)`: a future that is immediately ready with `v`.
pub fn resolved<T: Send + 'static>(v: T) -> DynFuture<T> {
    futures::future::ready(v).boxed()
}

/// `rejected(e)`: a future immediately ready with an error.
pub fn rejected<T: Send + 'static, E: Send + 'static>(e: E) -> DynFuture<Result<T, E>> {
    futures::future::ready(Err(e)).boxed()
}

/// `map(f, future)`: transform a future's output once it resolves, without
/// the transform itself being asynchronous.
pub fn map<T, U, F>(future: DynFuture<T>, f: F) -> DynFuture<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnOnce(T) -> U + Send + 'static,
{
    future.map(f).boxed()
}

/// `then(future, f)`: sequence an asynchronous continuation once a future
/// resolves.
pub fn then<T, U, F, Fut>(future: DynFuture<T>, f: F) -> DynFuture<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnOnce(T) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = U> + Send + 'static,
{
    future.then(f).boxed()
}

/// `all(futures)`: join a vector of futures, failing fast on the first
/// error while letting already-scheduled siblings run to completion (their
/// results are simply discarded).
pub fn all<T, E>(futures: Vec<DynFuture<Result<T, E>>>) -> DynFuture<Result<Vec<T>, E>>
where
    T: Send + 'static,
    E: Send + 'static,
{
    futures::future::try_join_all(futures).boxed()
}
