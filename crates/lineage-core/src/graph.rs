//! The type graph every class definition is emitted into.
//!
//! Each class contributes two nodes: an abstract marker whose supertype is
//! the superclass's marker, and a concrete node whose supertype is its own
//! marker. The root class is node 0 and is both the root of the graph and the
//! marker of its direct children's superclass. Concrete nodes are final:
//! nothing may declare them as a supertype.

use lineage_common::Atom;
use rustc_hash::FxHashMap;

use crate::types::TypeId;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Abstract,
    Concrete,
}

#[derive(Clone, Debug)]
pub struct TypeNode {
    pub name: Atom,
    pub kind: NodeKind,
    pub supertype: Option<TypeId>,
    /// Direct subtypes in declaration order.
    pub subtypes: Vec<TypeId>,
}

impl TypeNode {
    pub fn is_abstract(&self) -> bool {
        self.kind == NodeKind::Abstract
    }
}

pub struct TypeGraph {
    nodes: Vec<TypeNode>,
    by_name: FxHashMap<Atom, TypeId>,
}

impl TypeGraph {
    /// Create a graph holding only the (abstract) root class.
    pub fn new(root_name: Atom) -> Self {
        let mut by_name = FxHashMap::default();
        by_name.insert(root_name, TypeId::ROOT);
        Self {
            nodes: vec![TypeNode {
                name: root_name,
                kind: NodeKind::Abstract,
                supertype: None,
                subtypes: Vec::new(),
            }],
            by_name,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn lookup(&self, name: Atom) -> Option<TypeId> {
        self.by_name.get(&name).copied()
    }

    pub fn name(&self, id: TypeId) -> Option<Atom> {
        self.get(id).map(|node| node.name)
    }

    pub fn is_abstract(&self, id: TypeId) -> bool {
        self.get(id).is_some_and(TypeNode::is_abstract)
    }

    pub fn is_concrete(&self, id: TypeId) -> bool {
        self.get(id).is_some_and(|node| node.kind == NodeKind::Concrete)
    }

    pub fn supertype(&self, id: TypeId) -> Option<TypeId> {
        self.get(id).and_then(|node| node.supertype)
    }

    pub fn direct_subtypes(&self, id: TypeId) -> &[TypeId] {
        self.get(id)
            .map(|node| node.subtypes.as_slice())
            .unwrap_or_default()
    }

    /// Add a node. The caller guarantees the name is free and the supertype
    /// is an existing abstract node.
    pub(crate) fn add(&mut self, name: Atom, kind: NodeKind, supertype: Option<TypeId>) -> TypeId {
        debug_assert!(!self.by_name.contains_key(&name));
        debug_assert!(supertype.is_none_or(|sup| self.is_abstract(sup)));

        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(TypeNode {
            name,
            kind,
            supertype,
            subtypes: Vec::new(),
        });
        self.by_name.insert(name, id);
        if let Some(sup) = supertype {
            self.nodes[sup.0 as usize].subtypes.push(id);
        }
        id
    }

    /// Reflexive, transitive supertype walk: is `sub <: sup`?
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        let mut current = Some(sub);
        // A walk can visit each node at most once in an acyclic graph.
        for _ in 0..=self.nodes.len() {
            match current {
                Some(id) if id == sup => return true,
                Some(id) => current = self.supertype(id),
                None => return false,
            }
        }
        false
    }

    /// Does the supertype chain of `id` end in the root class?
    pub fn reaches_root(&self, id: TypeId) -> bool {
        self.get(id).is_some() && self.is_subtype(id, TypeId::ROOT)
    }
}

#[cfg(test)]
#[path = "../tests/graph_tests.rs"]
mod tests;
