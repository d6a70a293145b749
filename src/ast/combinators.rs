//! Public construction API for [`super::Ast`].

use super::Ast;
use crate::source::{BatchableSource, BatchedSource, DataSource, PlainSource};
use crate::value::AnyValue;

/// Lift a pure value. Adds no fetches.
///
/// `run(value(v)) == v` for any `v`.
pub fn value<T>(v: T) -> Ast
where
    T: Send + Sync + 'static,
{
    Ast::Value(AnyValue::new(v))
}

/// Wrap a `DataSource` with no batching capability.
///
/// The runner will call `fetch` once per distinct uncached identity of
/// this source type on a given frontier.
pub fn source<T>(s: T) -> Ast
where
    T: DataSource,
{
    Ast::Source(Box::new(PlainSource(s)))
}

/// Wrap a `BatchedSource`.
///
/// The runner will call `fetch_multi` once when ≥ 2 distinct uncached
/// identities of this source type are co-resident on a frontier, and
/// `fetch` otherwise.
pub fn batched_source<T>(s: T) -> Ast
where
    T: BatchedSource,
{
    Ast::Source(Box::new(BatchableSource(s)))
}

/// A fail-safe pure transform: `f` is applied once `a` resolves.
///
/// If `a` is already `Value(v)`, `f(v)` is computed eagerly rather than
/// deferred — not required for correctness but observationally identical
/// to the deferred form.
///
/// `map(id, a) ≡ a` and `map(g, map(f, a)) ≡ map(g∘f, a)`.
pub fn map<A, B, F>(f: F, a: Ast) -> Ast
where
    A: 'static,
    B: Send + Sync + 'static,
    F: FnOnce(A) -> B + Send + 'static,
{
    match a {
        Ast::Value(v) => Ast::Value(AnyValue::new(f(v.downcast::<A>()))),
        other => Ast::Map(
            Box::new(move |v: AnyValue| AnyValue::new(f(v.downcast::<A>()))),
            Box::new(other),
        ),
    }
}

/// Monadic bind: `f`'s `Ast` is not known until `a` resolves.
///
/// This is the only combinator that can introduce new fetches mid-run.
/// `bind(value, a) ≡ a` and `bind(f, value(x)) ≡ f(x)`
/// — the latter holds structurally here since a `Value` child
/// is planted into `f(x)` on the very first iteration (see
/// [`crate::plant::plant`]).
pub fn bind<A, F>(f: F, a: Ast) -> Ast
where
    A: 'static,
    F: FnOnce(A) -> Ast + Send + 'static,
{
    Ast::Bind(
        Box::new(move |v: AnyValue| f(v.downcast::<A>())),
        Box::new(a),
    )
}

/// An ordered sequence of child trees, resolved concurrently.
///
/// Result order equals input order regardless of completion order;
/// concurrency between siblings is unordered.
pub fn product(children: Vec<Ast>) -> Ast {
    Ast::Product(children)
}

/// Alias for [`product`] over a sequence.
pub fn collect(asts: Vec<Ast>) -> Ast {
    product(asts)
}

/// `traverse(f, a) == bind(xs -> collect(map(f, xs)), a)`:
/// resolve `a` to a `Vec<T>`, then run `f` over every element and collect
/// the results in order.
pub fn traverse<T, F>(f: F, a: Ast) -> Ast
where
    T: Send + Sync + 'static,
    F: Fn(T) -> Ast + Send + 'static,
{
    bind(
        move |xs: Vec<T>| collect(xs.into_iter().map(&f).collect()),
        a,
    )
}
