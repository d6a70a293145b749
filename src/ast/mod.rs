//! The fetch description tree.
//!
//! An [`Ast`] is the closed, five-variant sum type application code builds
//! before handing it to [`crate::runner::run`]. It is immutable: every
//! combinator in [`combinators`] produces a new tree rather than mutating
//! one in place.

mod combinators;

pub use combinators::{batched_source, bind, collect, map, product, source, traverse, value};

use crate::source::ErasedSource;
use crate::value::AnyValue;

/// A pure transform applied once its child resolves.
pub(crate) type MapFn = Box<dyn FnOnce(AnyValue) -> AnyValue + Send>;

/// A data-dependent continuation: the subsequent `Ast` is unknown until the
/// child resolves.
pub(crate) type BindFn = Box<dyn FnOnce(AnyValue) -> Ast + Send>;

/// The fetch description tree.
///
/// `Ast` has exactly five variants and no others are ever added by
/// application code — new behavior is expressed by composing the
/// combinators in this module, not by extending the enum.
pub enum Ast {
    /// A constant; already resolved.
    Value(AnyValue),
    /// An unresolved user `DataSource` instance.
    Source(Box<dyn ErasedSource>),
    /// A pure transformation to be applied once `child` resolves.
    Map(MapFn, Box<Ast>),
    /// A data-dependent continuation producing a new `Ast` from `child`'s
    /// resolved value.
    Bind(BindFn, Box<Ast>),
    /// An ordered sequence of children to be resolved concurrently.
    Product(Vec<Ast>),
}

impl Ast {
    /// True once this node is a fully-resolved `Value`.
    pub fn is_value(&self) -> bool {
        matches!(self, Ast::Value(_))
    }

    /// Consume a `Value` node, returning its erased payload.
    ///
    /// # Panics
    ///
    /// Panics if called on anything but `Ast::Value`. The runner only ever
    /// calls this after `plant` has collapsed the whole tree, which is the
    /// sole place this invariant is relied on.
    pub(crate) fn into_value(self) -> AnyValue {
        match self {
            Ast::Value(v) => v,
            _ => panic!("fetchplan: into_value called on an unresolved Ast node"),
        }
    }

    /// Count of `Source` nodes reachable without crossing an unresolved
    /// `Bind` — the same reachability rule the frontier analyzer uses.
    /// Used by the runner's progress invariant check.
    pub(crate) fn reachable_source_count(&self) -> usize {
        match self {
            Ast::Value(_) => 0,
            Ast::Source(_) => 1,
            Ast::Map(_, child) => child.reachable_source_count(),
            Ast::Bind(_, child) => child.reachable_source_count(),
            Ast::Product(children) => children.iter().map(Ast::reachable_source_count).sum(),
        }
    }
}
