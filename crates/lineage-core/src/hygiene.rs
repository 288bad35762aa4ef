//! Type-parameter hygiene.
//!
//! A class inherits its ancestors' type parameters. If a descendant declares
//! a parameter with the same name as an ancestor's, the two must stay
//! distinct in the descendant's concrete layout, so every inherited parameter
//! is renamed before it is merged:
//!
//! ```text
//! Foo{T}            fields: x::T
//! Bar{T} <: Foo     params: [T#3, T]   fields: x::T#3, y::T
//! ```
//!
//! A `HygieneScope` renames consistently within one metadata computation;
//! every scope draws a new generation from its `Hygiene`, so two scopes never
//! produce the same fresh name.

use lineage_common::limits::HYGIENE_SEPARATOR;
use lineage_common::{Atom, Interner};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

use crate::types::{TypeExpr, TypeSubstitution, WhereClause};

/// Source of hygiene generations.
pub struct Hygiene {
    next_generation: AtomicU32,
}

impl Default for Hygiene {
    fn default() -> Self {
        Self::new()
    }
}

impl Hygiene {
    pub fn new() -> Self {
        Self {
            next_generation: AtomicU32::new(1),
        }
    }

    /// Open a renaming scope with a fresh generation.
    pub fn scope<'a>(&self, interner: &'a Interner) -> HygieneScope<'a> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        HygieneScope {
            interner,
            generation,
            renames: FxHashMap::default(),
        }
    }
}

pub struct HygieneScope<'a> {
    interner: &'a Interner,
    generation: u32,
    renames: FxHashMap<Atom, Atom>,
}

impl HygieneScope<'_> {
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Fresh name for `name`; the same input always yields the same output
    /// within this scope.
    pub fn rename(&mut self, name: Atom) -> Atom {
        if let Some(&fresh) = self.renames.get(&name) {
            return fresh;
        }
        let original = self.interner.resolve(name);
        let fresh = self.interner.intern(&format!(
            "{}{}{}",
            base_name(&original),
            HYGIENE_SEPARATOR,
            self.generation
        ));
        trace!(
            original = %original,
            generation = self.generation,
            "hygiene rename"
        );
        self.renames.insert(name, fresh);
        fresh
    }

    /// Rename every clause's parameter, then rewrite the bounds so that a
    /// bound referring to a sibling parameter follows the rename.
    pub fn rename_where(&mut self, clauses: &[WhereClause]) -> Vec<WhereClause> {
        let fresh: Vec<Atom> = clauses
            .iter()
            .map(|clause| self.rename(clause.name))
            .collect();
        let subst = self.substitution();
        clauses
            .iter()
            .zip(fresh)
            .map(|(clause, name)| WhereClause::new(name, clause.bound.substitute(&subst)))
            .collect()
    }

    /// Rewrite the parameters this scope has renamed; others are untouched.
    pub fn rename_type(&self, ty: &TypeExpr) -> TypeExpr {
        ty.substitute(&self.substitution())
    }

    /// The renames performed so far as `original → Param(fresh)`.
    pub fn substitution(&self) -> TypeSubstitution {
        let mut subst = TypeSubstitution::new();
        for (&original, &fresh) in &self.renames {
            subst.insert(original, TypeExpr::Param(fresh));
        }
        subst
    }
}

/// Strip a hygiene suffix: `T#12` → `T`.
pub fn base_name(name: &str) -> &str {
    name.split_once(HYGIENE_SEPARATOR)
        .map_or(name, |(base, _)| base)
}

#[cfg(test)]
#[path = "../tests/hygiene_tests.rs"]
mod tests;
