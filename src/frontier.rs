//! The frontier analyzer.
//!
//! Walks an [`Ast`] and returns the `Source` nodes ready to fetch *now*,
//! grouped by source name and deduplicated by identity within each group.
//! `Bind`'s right-hand side is never visited — it is unknown until its
//! child resolves, which is what makes a `Bind` the only barrier that
//! splits a run into sequential phases.

use std::collections::HashMap;

use crate::ast::Ast;
use crate::source::{CacheKey, ErasedSource, SourceName};

/// The ready frontier, grouped by source name and deduplicated by
/// identity. Iteration order within a group is insertion order (first
/// occurrence in a left-to-right, depth-first walk).
#[derive(Default)]
pub struct Frontier {
    groups: HashMap<SourceName, Vec<Box<dyn ErasedSource>>>,
}

impl Frontier {
    /// The groups, keyed by source name.
    pub fn groups(&self) -> &HashMap<SourceName, Vec<Box<dyn ErasedSource>>> {
        &self.groups
    }

    /// Consume the frontier, yielding its groups.
    pub fn into_groups(self) -> HashMap<SourceName, Vec<Box<dyn ErasedSource>>> {
        self.groups
    }

    /// Whether the frontier has no ready sources at all.
    pub fn is_empty(&self) -> bool {
        self.groups.values().all(Vec::is_empty)
    }

    fn push(&mut self, s: &dyn ErasedSource, seen: &mut HashMap<SourceName, Vec<CacheKey>>) {
        let name = s.source_name();
        let key = s.cache_key();
        let seen_keys = seen.entry(name.clone()).or_default();
        if seen_keys.contains(&key) {
            return;
        }
        seen_keys.push(key);
        self.groups.entry(name).or_default().push(s.clone_erased());
    }
}

/// Compute the current ready frontier of `ast`.
///
/// Recursion rules:
/// 1. `Value` contributes nothing.
/// 2. `Source(s)` contributes `s`.
/// 3. `Map(_, c)` recurses into `c`.
/// 4. `Product([c1..cn])` recurses into every child, unioning results.
/// 5. `Bind(_, c)` recurses into `c` only.
pub fn analyze(ast: &Ast) -> Frontier {
    let mut frontier = Frontier::default();
    let mut seen: HashMap<SourceName, Vec<CacheKey>> = HashMap::new();
    walk(ast, &mut frontier, &mut seen);
    frontier
}

fn walk(ast: &Ast, frontier: &mut Frontier, seen: &mut HashMap<SourceName, Vec<CacheKey>>) {
    match ast {
        Ast::Value(_) => {}
        Ast::Source(s) => frontier.push(s.as_ref(), seen),
        Ast::Map(_, child) => walk(child, frontier, seen),
        Ast::Bind(_, child) => walk(child, frontier, seen),
        Ast::Product(children) => {
            for child in children {
                walk(child, frontier, seen);
            }
        }
    }
}
