//! The planter: pure substitution and collapse.
//!
//! Given an `Ast` and the current cache, produces a new `Ast` with every
//! resolvable `Source` replaced by its `Value`, and every combinator whose
//! operands are now fully resolved collapsed into a `Value` itself.
//! Planting never suspends and runs in `O(tree size)`.

use crate::ast::Ast;
use crate::cache::Cache;

/// Plant `ast` against `cache`, substituting resolved sources and
/// collapsing pure combinators:
///
/// - `Source(s)`: becomes `Value(v)` if `cache` has a hit for `(source_name(s),
///   identity(s))`; otherwise unchanged.
/// - `Value(v)`: unchanged.
/// - `Map(f, c)`: plant `c`; if the result is `Value(v)`, become
///   `Value(f(v))`; else rewrap.
/// - `Product([c1..cn])`: plant every child; if *all* are `Value`, become
///   `Value([v1..vn])`; else rewrap with the planted children.
/// - `Bind(f, c)`: plant `c`; if the result is `Value(v)`, become `f(v)`
///   (a fresh, unplanted `Ast` — it is not planted again in this pass, so
///   a `Bind` whose continuation immediately resolves still needs one more
///   runner iteration to be collapsed).
pub fn plant(ast: Ast, cache: &Cache) -> Ast {
    let mut bind_expanded = false;
    plant_rec(ast, cache, &mut bind_expanded)
}

/// Like [`plant`], but additionally reports whether any `Bind` invoked its
/// continuation during this pass. The runner uses this to evaluate its
/// progress invariant: a `Bind` expansion is allowed to *grow* the tree's
/// unresolved-source count (e.g. one `FriendsOf` source expanding into five
/// `ActivityScore` sources), which would otherwise look like no progress
/// at all.
pub(crate) fn plant_with_expansion(ast: Ast, cache: &Cache) -> (Ast, bool) {
    let mut bind_expanded = false;
    let planted = plant_rec(ast, cache, &mut bind_expanded);
    (planted, bind_expanded)
}

fn plant_rec(ast: Ast, cache: &Cache, bind_expanded: &mut bool) -> Ast {
    match ast {
        Ast::Value(v) => Ast::Value(v),

        Ast::Source(s) => match cache.lookup_source(s.as_ref()) {
            Some(cached) => Ast::Value(s.clone_cached_value(cached)),
            None => Ast::Source(s),
        },

        Ast::Map(f, child) => match plant_rec(*child, cache, bind_expanded) {
            Ast::Value(v) => Ast::Value(f(v)),
            planted => Ast::Map(f, Box::new(planted)),
        },

        Ast::Bind(f, child) => match plant_rec(*child, cache, bind_expanded) {
            Ast::Value(v) => {
                *bind_expanded = true;
                f(v)
            }
            planted => Ast::Bind(f, Box::new(planted)),
        },

        Ast::Product(children) => {
            let planted: Vec<Ast> = children
                .into_iter()
                .map(|c| plant_rec(c, cache, bind_expanded))
                .collect();
            if planted.iter().all(Ast::is_value) {
                let values = planted.into_iter().map(Ast::into_value).collect::<Vec<_>>();
                Ast::Value(crate::value::AnyValue::new(values))
            } else {
                Ast::Product(planted)
            }
        }
    }
}
