//! The external `DataSource` contract and its type-erased form.
//!
//! Application code implements [`DataSource`] (and, optionally,
//! [`BatchedSource`]) for each concrete kind of remote data it fetches.
//! The runner never sees a concrete `DataSource`: every `Source` AST node
//! stores a `Box<dyn ErasedSource>` so that a single `Ast` can carry many
//! unrelated source types.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use downcast_rs::{impl_downcast, Downcast};
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::FetchError;
use crate::value::{AnyValue, Env};

/// A stable string naming a concrete `DataSource` type.
///
/// Used as the outer cache key and as the batch-grouping key.
pub type SourceName = Cow<'static, str>;

/// Required capability of every fetchable source: a stable name, a
/// hashable identity, and a single-item fetch.
///
/// `Clone` is required so that [`BatchedSource::fetch_multi`] can be given
/// an owned slice of sibling source instances reconstructed from the
/// erased frontier — source descriptors are expected to be small values
/// (an id, a key), not live connections.
#[async_trait]
pub trait DataSource: Clone + Send + Sync + 'static {
    /// The type identifying a requested item within this source type.
    type Identity: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static;
    /// The type this source resolves to.
    ///
    /// `Clone` is required because a single cached resolution may need to
    /// be planted into more than one `Source` node at once — the frontier
    /// analyzer dedups by identity for *fetching*, but a duplicated
    /// identity can still appear at several independent tree positions,
    /// each of which gets its own owned copy.
    type Value: Clone + Send + Sync + 'static;

    /// A stable string tag for the concrete source type.
    fn source_name(&self) -> SourceName;

    /// The identity of the item this instance requests.
    fn identity(&self) -> Self::Identity;

    /// Perform the single-item fetch.
    async fn fetch(&self, env: &Env) -> Result<Self::Value, FetchError>;
}

/// Optional capability: a homogeneous batch fetch for ≥ 2 uncached
/// identities of the same source type on one frontier.
#[async_trait]
pub trait BatchedSource: DataSource {
    /// Fetch a batch of sibling sources at once.
    ///
    /// The returned map's key set must equal `{ identity(s) | s ∈ sources
    /// }`; a missing identity is a fetch failure.
    async fn fetch_multi(
        sources: &[Self],
        env: &Env,
    ) -> Result<HashMap<Self::Identity, Self::Value>, FetchError>
    where
        Self: Sized;
}

/// A type-erased, hashable, comparable wrapper around a concrete
/// `DataSource::Identity`.
///
/// Lets identities of unrelated concrete types share one `HashMap` inside
/// the [`crate::cache::Cache`], which is keyed `source_name -> identity ->
/// value` rather than one composite key.
#[derive(Clone)]
pub struct CacheKey(Arc<dyn ErasedIdentity>);

impl CacheKey {
    /// Erase a concrete identity.
    pub fn new<T>(identity: T) -> Self
    where
        T: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        Self(Arc::new(identity))
    }

    fn downcast_ref<T: ErasedIdentity>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_erased(other.0.as_ref())
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash_erased(&mut HasherMut(state));
    }
}

trait ErasedIdentity: Downcast + Send + Sync + fmt::Debug {
    fn eq_erased(&self, other: &dyn ErasedIdentity) -> bool;
    fn hash_erased(&self, state: &mut dyn Hasher);
}

impl_downcast!(ErasedIdentity);

impl<T> ErasedIdentity for T
where
    T: Hash + Eq + fmt::Debug + Send + Sync + 'static,
{
    fn eq_erased(&self, other: &dyn ErasedIdentity) -> bool {
        match other.as_any().downcast_ref::<T>() {
            Some(other) => self == other,
            None => false,
        }
    }

    fn hash_erased(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }
}

/// Adapts `&mut dyn Hasher` back to `impl Hasher` so `T::hash` can take it.
struct HasherMut<'a>(&'a mut dyn Hasher);

impl Hasher for HasherMut<'_> {
    fn finish(&self) -> u64 {
        self.0.finish()
    }
    fn write(&mut self, bytes: &[u8]) {
        self.0.write(bytes)
    }
}

/// Object-safe, type-erased view of a [`DataSource`] stored in
/// `Ast::Source`.
///
/// Built by [`crate::ast::source`] (plain) or [`crate::ast::batched_source`]
/// (batching-capable). The runner only ever interacts with sources through
/// this trait, which is how the AST stays a closed five-variant sum type
/// despite carrying arbitrarily many concrete `DataSource` implementations.
pub trait ErasedSource: Downcast + Send + Sync {
    /// See [`DataSource::source_name`].
    fn source_name(&self) -> SourceName;

    /// The erased identity, suitable as a cache key.
    fn cache_key(&self) -> CacheKey;

    /// Perform the single-item fetch, erasing the result.
    fn fetch_erased(&self, env: Env) -> BoxFuture<'static, Result<AnyValue, FetchError>>;

    /// Attempt a batched fetch across `group` (which includes `self`).
    ///
    /// Returns `None` for sources built via [`crate::ast::source`] (no
    /// batching capability); `Some` for sources built via
    /// [`crate::ast::batched_source`]. The runner only calls this when
    /// `group.len() >= 2`.
    fn fetch_multi_erased(
        &self,
        group: &[Box<dyn ErasedSource>],
        env: Env,
    ) -> Option<BoxFuture<'static, Result<HashMap<CacheKey, AnyValue>, FetchError>>>;

    /// Clone this source behind a fresh box, used when the frontier
    /// analyzer needs to hand out owned copies for batch dispatch.
    fn clone_erased(&self) -> Box<dyn ErasedSource>;

    /// Clone a cache-resident value known to belong to this source's
    /// `Value` type, for planting into this node (see [`DataSource::Value`]'s
    /// `Clone` bound).
    fn clone_cached_value(&self, cached: &AnyValue) -> AnyValue;
}

impl_downcast!(ErasedSource);

/// Erasure for a plain [`DataSource`] with no batching capability.
pub(crate) struct PlainSource<T: DataSource>(pub T);

impl<T: DataSource> ErasedSource for PlainSource<T> {
    fn source_name(&self) -> SourceName {
        self.0.source_name()
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.0.identity())
    }

    fn fetch_erased(&self, env: Env) -> BoxFuture<'static, Result<AnyValue, FetchError>> {
        let source = self.0.clone();
        async move { source.fetch(&env).await.map(AnyValue::new) }.boxed()
    }

    fn fetch_multi_erased(
        &self,
        _group: &[Box<dyn ErasedSource>],
        _env: Env,
    ) -> Option<BoxFuture<'static, Result<HashMap<CacheKey, AnyValue>, FetchError>>> {
        None
    }

    fn clone_erased(&self) -> Box<dyn ErasedSource> {
        Box::new(PlainSource(self.0.clone()))
    }

    fn clone_cached_value(&self, cached: &AnyValue) -> AnyValue {
        cached
            .try_clone::<T::Value>()
            .expect("fetchplan: cached value type did not match this source's Value type")
    }
}

/// Erasure for a [`BatchedSource`].
pub(crate) struct BatchableSource<T: BatchedSource>(pub T);

impl<T: BatchedSource> ErasedSource for BatchableSource<T> {
    fn source_name(&self) -> SourceName {
        self.0.source_name()
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.0.identity())
    }

    fn fetch_erased(&self, env: Env) -> BoxFuture<'static, Result<AnyValue, FetchError>> {
        let source = self.0.clone();
        async move { source.fetch(&env).await.map(AnyValue::new) }.boxed()
    }

    fn fetch_multi_erased(
        &self,
        group: &[Box<dyn ErasedSource>],
        env: Env,
    ) -> Option<BoxFuture<'static, Result<HashMap<CacheKey, AnyValue>, FetchError>>> {
        let mut concrete = Vec::with_capacity(group.len());
        for member in group {
            let typed = member
                .downcast_ref::<BatchableSource<T>>()
                .expect("fetchplan: batch group contained a source of a mismatched concrete type");
            concrete.push(typed.0.clone());
        }
        Some(
            async move {
                let results = T::fetch_multi(&concrete, &env).await?;
                Ok(results
                    .into_iter()
                    .map(|(id, value)| (CacheKey::new(id), AnyValue::new(value)))
                    .collect())
            }
            .boxed(),
        )
    }

    fn clone_erased(&self) -> Box<dyn ErasedSource> {
        Box::new(BatchableSource(self.0.clone()))
    }

    fn clone_cached_value(&self, cached: &AnyValue) -> AnyValue {
        cached
            .try_clone::<T::Value>()
            .expect("fetchplan: cached value type did not match this source's Value type")
    }
}

/// Build an erased descriptor for a plain [`DataSource`], for addressing a
/// `(source_name, identity)` pair without going through the `Ast` — chiefly
/// useful for seeding a [`crate::cache::Cache`] before a run.
pub fn describe<T: DataSource>(s: T) -> Box<dyn ErasedSource> {
    Box::new(PlainSource(s))
}

/// As [`describe`], for a [`BatchedSource`].
pub fn describe_batched<T: BatchedSource>(s: T) -> Box<dyn ErasedSource> {
    Box::new(BatchableSource(s))
}

/// `source_name(s)`, exposed for cache-seeding.
pub fn resource_name(s: &dyn ErasedSource) -> SourceName {
    s.source_name()
}

/// `identity(s)` as a [`CacheKey`], exposed for cache-seeding.
pub fn cache_id(s: &dyn ErasedSource) -> CacheKey {
    s.cache_key()
}
