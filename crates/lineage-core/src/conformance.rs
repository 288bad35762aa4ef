//! Value conformance and type specificity.
//!
//! `TypeChecker` decides whether runtime values fit declared types, binding
//! type parameters on the way, and ranks constructor signatures for
//! dispatch.

use crate::graph::TypeGraph;
use crate::types::{FieldDecl, TypeExpr, TypeSubstitution, WhereClause};
use crate::values::Value;

pub(crate) struct TypeChecker<'g> {
    graph: &'g TypeGraph,
}

impl<'g> TypeChecker<'g> {
    pub(crate) fn new(graph: &'g TypeGraph) -> Self {
        Self { graph }
    }

    /// Does `value` fit `ty`? An unbound parameter is bound to the value's
    /// inferred type; a bound one is checked against its binding.
    pub(crate) fn match_value(
        &self,
        ty: &TypeExpr,
        value: &Value,
        bindings: &mut TypeSubstitution,
    ) -> bool {
        match ty {
            TypeExpr::Any => true,
            TypeExpr::Prim(prim) => prim.accepts(value),
            TypeExpr::Named(name) => match (value, self.graph.lookup(*name)) {
                (Value::Object(instance), Some(target)) => {
                    self.graph.is_subtype(instance.class(), target)
                }
                _ => false,
            },
            TypeExpr::Param(name) => {
                if let Some(bound) = bindings.get(*name).cloned() {
                    return self.match_value(&bound, value, bindings);
                }
                bindings.insert(*name, infer(value));
                true
            }
            TypeExpr::List(element) => match value {
                Value::List(items) => items
                    .iter()
                    .all(|item| self.match_value(element, item, bindings)),
                _ => false,
            },
        }
    }

    /// Match arguments positionally. The caller checks arity.
    pub(crate) fn match_params(
        &self,
        params: &[FieldDecl],
        args: &[Value],
        bindings: &mut TypeSubstitution,
    ) -> bool {
        params
            .iter()
            .zip(args)
            .all(|(param, arg)| self.match_value(&param.ty, arg, bindings))
    }

    pub(crate) fn is_subtype(&self, sub: &TypeExpr, sup: &TypeExpr) -> bool {
        match (sub, sup) {
            (_, TypeExpr::Any) => true,
            (TypeExpr::Prim(a), TypeExpr::Prim(b)) => a.is_subtype_of(*b),
            (TypeExpr::Named(a), TypeExpr::Named(b)) => {
                match (self.graph.lookup(*a), self.graph.lookup(*b)) {
                    (Some(a), Some(b)) => self.graph.is_subtype(a, b),
                    _ => a == b,
                }
            }
            (TypeExpr::List(a), TypeExpr::List(b)) => self.is_subtype(a, b),
            _ => sub == sup,
        }
    }

    /// First clause whose binding violates its bound. Unbound parameters are
    /// skipped; bounds may mention earlier parameters.
    pub(crate) fn bounds_hold<'c>(
        &self,
        params: &'c [WhereClause],
        bindings: &TypeSubstitution,
    ) -> Option<&'c WhereClause> {
        params.iter().find(|clause| {
            bindings.get(clause.name).is_some_and(|actual| {
                !self.is_subtype(actual, &clause.bound.substitute(bindings))
            })
        })
    }

    /// Rank of a parameter type; higher is more specific.
    pub(crate) fn specificity(&self, ty: &TypeExpr) -> u32 {
        match ty {
            TypeExpr::Any => 0,
            TypeExpr::Param(_) => 1,
            TypeExpr::Prim(prim) if prim.is_abstract() => 2,
            TypeExpr::Prim(_) => 3,
            TypeExpr::Named(name) => match self.graph.lookup(*name) {
                Some(id) if self.graph.is_abstract(id) => 2,
                _ => 3,
            },
            TypeExpr::List(element) => 1 + self.specificity(element),
        }
    }
}

/// The most specific type describing `value`.
pub(crate) fn infer(value: &Value) -> TypeExpr {
    match value {
        Value::Nothing => TypeExpr::NOTHING,
        Value::Bool(_) => TypeExpr::BOOL,
        Value::Int(_) => TypeExpr::INT,
        Value::Float(_) => TypeExpr::FLOAT,
        Value::Str(_) => TypeExpr::STR,
        Value::Object(instance) => TypeExpr::Named(instance.layout().name),
        Value::List(items) => {
            let mut element = items.iter().map(infer);
            let first = element.next();
            match first {
                Some(first) if element.all(|ty| ty == first) => TypeExpr::list(first),
                _ => TypeExpr::list(TypeExpr::Any),
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/conformance_tests.rs"]
mod tests;
