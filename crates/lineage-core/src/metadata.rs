//! Class metadata store.
//!
//! `ClassRegistry::info` answers "what does a subclass of this class
//! inherit?": the where-clauses and fields of the class with every type
//! parameter hygienically renamed, and its superclass. The compiler asks for
//! the superclass's info before merging a new class.
//!
//! Results are memoized per `TypeId` and never invalidated. The cache is a
//! `DashMap` filled with entry-or-insert: when several threads compute the
//! same entry concurrently, the first insert wins and every caller returns
//! that same `Arc`.

use dashmap::DashMap;
use lineage_common::Atom;
use std::sync::Arc;
use tracing::trace;

use crate::errors::{ClassError, Result};
use crate::hygiene::Hygiene;
use crate::registry::ClassRegistry;
use crate::types::{FieldDecl, TypeId, TypeSubstitution, WhereClause};

/// What a class passes on to its subclasses.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassInfo {
    /// Every parameter of the class's layout, renamed, in layout order.
    pub where_clauses: Vec<WhereClause>,
    /// Every field of the class's layout, with renamed parameter types.
    pub fields: Vec<FieldDecl>,
    pub superclass: Option<TypeId>,
    /// `original parameter → Param(renamed)` for the renames above.
    pub substitution: TypeSubstitution,
}

impl ClassInfo {
    pub fn field_names(&self) -> impl Iterator<Item = Atom> + '_ {
        self.fields.iter().map(|field| field.name)
    }
}

pub struct MetadataStore {
    cache: DashMap<TypeId, Arc<ClassInfo>>,
    hygiene: Hygiene,
}

impl Default for MetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataStore {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
            hygiene: Hygiene::new(),
        }
    }

    pub fn hygiene(&self) -> &Hygiene {
        &self.hygiene
    }

    /// Cached entry, without computing it.
    pub fn get(&self, id: TypeId) -> Option<Arc<ClassInfo>> {
        self.cache.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Return the cached entry or compute and insert it.
    ///
    /// `compute` runs without any cache lock held, so it may itself query the
    /// store (for other keys).
    pub fn get_or_compute(
        &self,
        id: TypeId,
        compute: impl FnOnce(&Hygiene) -> Result<ClassInfo>,
    ) -> Result<Arc<ClassInfo>> {
        if let Some(hit) = self.get(id) {
            trace!(type_id = id.0, "metadata cache hit");
            return Ok(hit);
        }
        let computed = compute(&self.hygiene)?;
        let entry = self
            .cache
            .entry(id)
            .or_insert_with(|| Arc::new(computed));
        trace!(type_id = id.0, "metadata cache fill");
        Ok(Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl ClassRegistry {
    /// Inherited view of `class`: renamed where-clauses and fields, plus its
    /// superclass.
    ///
    /// - the root class has no fields, no parameters and no superclass;
    /// - a class marker has no fields or parameters of its own and reports
    ///   the superclass of the class it marks;
    /// - any other type is `NotAClass`.
    pub fn info(&self, class: TypeId) -> Result<Arc<ClassInfo>> {
        self.metadata()
            .get_or_compute(class, |hygiene| self.compute_info(class, hygiene))
    }

    fn compute_info(&self, class: TypeId, hygiene: &Hygiene) -> Result<ClassInfo> {
        if class.is_root() {
            return Ok(ClassInfo::default());
        }

        if let Some(def) = self.class_def(class) {
            let mut scope = hygiene.scope(self.interner());
            let where_clauses = scope.rename_where(&def.layout.type_params);
            let substitution = scope.substitution();
            let fields = def
                .layout
                .fields
                .iter()
                .map(|(name, ty)| FieldDecl::new(*name, ty.substitute(&substitution)))
                .collect();
            return Ok(ClassInfo {
                where_clauses,
                fields,
                superclass: def.superclass,
                substitution,
            });
        }

        if let Some(owner) = self.marker_owner(class) {
            return Ok(ClassInfo {
                superclass: self.superclass(owner)?,
                ..ClassInfo::default()
            });
        }

        Err(ClassError::NotAClass(self.type_name(class)))
    }
}

#[cfg(test)]
#[path = "../tests/metadata_tests.rs"]
mod tests;
