//! Hierarchy reflection.
//!
//! Every query here is answered from the type graph and the recorded
//! superclass facts; none of them mutates anything.
//!
//! `issubclass(a, b)` reads "`a` is `b` or one of its ancestors". The
//! argument order is the opposite of the usual subtype test:
//!
//! ```ignore
//! assert!(registry.issubclass(foo, bar)); // Bar <: Foo
//! assert!(!registry.issubclass(bar, foo));
//! ```

use smallvec::SmallVec;
use tracing::debug;

use crate::errors::{ClassError, Result};
use crate::registry::ClassRegistry;
use crate::types::TypeId;

impl ClassRegistry {
    /// Direct superclass. `None` only for the root.
    pub fn superclass(&self, class: TypeId) -> Result<Option<TypeId>> {
        if class.is_root() {
            return Ok(None);
        }
        self.class_def(class)
            .map(|def| def.superclass)
            .ok_or_else(|| ClassError::NotAClass(self.type_name(class)))
    }

    /// Every ancestor, nearest first, ending with the root.
    ///
    /// A chain longer than `max_hierarchy_depth` is an error, never a
    /// truncated list.
    pub fn superclasses(&self, class: TypeId) -> Result<SmallVec<[TypeId; 8]>> {
        let limit = self.options().max_hierarchy_depth;
        let mut out: SmallVec<[TypeId; 8]> = SmallVec::new();
        let mut current = self.superclass(class)?;
        while let Some(ancestor) = current {
            if out.len() >= limit as usize {
                return Err(self.hierarchy_too_deep(class));
            }
            out.push(ancestor);
            current = self.superclass(ancestor)?;
        }
        Ok(out)
    }

    /// The root, or a concrete type whose supertypes lead to the root.
    pub fn isclass(&self, ty: TypeId) -> bool {
        if ty.is_root() {
            return true;
        }
        let graph = self.graph();
        graph.is_concrete(ty) && graph.reaches_root(ty)
    }

    /// True when `ancestor` is `class` or appears in `superclasses(class)`.
    pub fn issubclass(&self, ancestor: TypeId, class: TypeId) -> bool {
        ancestor == class
            || self
                .superclasses(class)
                .is_ok_and(|ancestors| ancestors.contains(&ancestor))
    }

    /// The concrete class behind `ty`: `ty` itself when concrete, otherwise
    /// its single direct concrete subtype.
    pub fn classof(&self, ty: TypeId) -> Result<TypeId> {
        let (marker, candidates) = {
            let graph = self.graph();
            match graph.get(ty) {
                Some(node) if !node.is_abstract() => return Ok(ty),
                Some(node) => {
                    let candidates: Vec<TypeId> = node
                        .subtypes
                        .iter()
                        .copied()
                        .filter(|sub| graph.is_concrete(*sub))
                        .collect();
                    (Some(node.name), candidates)
                }
                None => (None, Vec::new()),
            }
        };
        let Some(marker) = marker else {
            return Err(ClassError::NotAClass(self.type_name(ty)));
        };
        if let [only] = candidates[..] {
            return Ok(only);
        }

        let marker = self.resolve(marker).to_string();
        let candidates: Vec<String> = candidates.into_iter().map(|id| self.type_name(id)).collect();
        debug!(%marker, ?candidates, "ambiguous concrete class");
        Err(ClassError::AmbiguousConcreteClass { marker, candidates })
    }

    /// Every descendant class, in pre-order and declaration order.
    pub fn subclasses(&self, class: TypeId) -> Result<Vec<TypeId>> {
        let marker = if class.is_root() {
            TypeId::ROOT
        } else {
            self.absclass(class)?
        };
        let mut out = Vec::new();
        self.collect_subclasses(marker, 0, &mut out)?;
        Ok(out)
    }

    fn collect_subclasses(&self, marker: TypeId, depth: u32, out: &mut Vec<TypeId>) -> Result<()> {
        let children: Vec<TypeId> = {
            let graph = self.graph();
            graph
                .direct_subtypes(marker)
                .iter()
                .copied()
                .filter(|sub| graph.is_abstract(*sub))
                .collect()
        };
        if !children.is_empty() && depth >= self.options().max_hierarchy_depth {
            return Err(self.hierarchy_too_deep(marker));
        }
        for child in children {
            out.push(self.classof(child)?);
            self.collect_subclasses(child, depth + 1, out)?;
        }
        Ok(())
    }

    fn hierarchy_too_deep(&self, ty: TypeId) -> ClassError {
        ClassError::HierarchyDepthExceeded {
            class: self.type_name(ty),
            limit: self.options().max_hierarchy_depth,
        }
    }

    /// The abstract marker of a concrete class.
    pub fn absclass(&self, class: TypeId) -> Result<TypeId> {
        if self.graph().is_abstract(class) {
            return Err(ClassError::NotAConcreteClass(self.type_name(class)));
        }
        self.class_def(class)
            .map(|def| def.marker)
            .ok_or_else(|| ClassError::NotAClass(self.type_name(class)))
    }
}

#[cfg(test)]
#[path = "../tests/reflection_tests.rs"]
mod tests;
