//! The opaque value slot threaded through the AST.
//!
//! The AST (`crate::ast::Ast`) is a single closed sum type, but the values
//! flowing through its `Map`/`Bind`/`Product` nodes are heterogeneous: a
//! `Source` resolves to whatever type its `DataSource` produces, a `Map`
//! produces something else again. Rather than make `Ast` generic over a
//! value type (which would force the whole tree to carry one type end to
//! end, defeating `Bind`), node payloads are stored behind a single erased
//! slot and downcast at the point of use.

use std::any::Any;
use std::fmt;

/// A type-erased, owned value that can be downcast back to its concrete type.
///
/// Every `Ast::Value`, every `Map`/`Bind` closure argument and result, and
/// every cache entry is an `AnyValue`. Construction is infallible; downcasts
/// fail only if the caller asks for the wrong concrete type, which indicates
/// a bug in the combinator that produced the value.
pub struct AnyValue(Box<dyn Any + Send + Sync>);

impl AnyValue {
    /// Erase a concrete value.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Erase the unit value, used as the default `Env` and the result of
    /// combinators that carry no payload (e.g. an empty `product([])`).
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Recover the concrete value, consuming the wrapper.
    ///
    /// # Panics
    ///
    /// Panics if `T` does not match the type that was erased. This is only
    /// ever reachable through a bug in a combinator's own bookkeeping (user
    /// code never supplies `T` directly), so a panic rather than a `Result`
    /// keeps call sites free of dead error-handling paths.
    pub fn downcast<T: 'static>(self) -> T {
        match self.0.downcast::<T>() {
            Ok(value) => *value,
            Err(_) => panic!(
                "fetchplan: AnyValue downcast mismatch, expected {}",
                std::any::type_name::<T>()
            ),
        }
    }

    /// Borrow the concrete value without consuming the wrapper.
    ///
    /// Returns `None` on a type mismatch instead of panicking, since
    /// `downcast_ref` is used by cache lookups where a miss is routine.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Clone the erased value if its concrete type implements `Clone`.
    pub fn try_clone<T: Clone + Send + Sync + 'static>(&self) -> Option<Self> {
        self.downcast_ref::<T>().map(|v| Self::new(v.clone()))
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnyValue").field(&"<erased>").finish()
    }
}

/// The opaque environment value threaded unchanged to every fetch.
///
/// `Env` is a cheap-to-clone `AnyValue` wrapped so call sites read
/// `&Env` rather than `&AnyValue`; the core never interprets it.
#[derive(Clone)]
pub struct Env(std::sync::Arc<AnyValue>);

impl Env {
    /// Wrap a concrete environment value.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self(std::sync::Arc::new(AnyValue::new(value)))
    }

    /// The default environment: an opaque unit value.
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Borrow the concrete environment value.
    ///
    /// # Panics
    ///
    /// Panics on a type mismatch, same as [`AnyValue::downcast`] — the
    /// environment's concrete type is fixed for the lifetime of one run, so
    /// a mismatch here means the caller is reading the wrong `Env`.
    pub fn get<T: 'static>(&self) -> &T {
        self.0
            .downcast_ref::<T>()
            .unwrap_or_else(|| panic!("fetchplan: Env downcast mismatch, expected {}", std::any::type_name::<T>()))
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Env").field(&"<erased>").finish()
    }
}
