//! Type identifiers and type expressions.
//!
//! Classes, their abstract markers and any extra types users declare are
//! nodes of a `TypeGraph`, addressed by `TypeId`. Field and parameter types
//! are `TypeExpr`s that are checked against runtime `Value`s when a
//! constructor runs.

use lineage_common::{Atom, Interner};
use rustc_hash::FxHashMap;

use crate::values::Value;

// =============================================================================
// TypeId
// =============================================================================

/// A node in the type graph: a concrete class, an abstract marker, the root
/// class, or a type declared through `declare_*_type`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The root class. It has no fields, no parameters and no superclass, and
    /// it is the marker every root child's marker derives from.
    pub const ROOT: Self = Self(0);

    pub const fn is_root(self) -> bool {
        self.0 == Self::ROOT.0
    }
}

// =============================================================================
// Primitive types
// =============================================================================

/// Built-in value types.
///
/// `Number` is abstract: it accepts both `Int` and `Float` values and is the
/// usual upper bound of numeric type parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Prim {
    Nothing,
    Bool,
    Int,
    Float,
    Number,
    Str,
}

impl Prim {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Nothing" => Self::Nothing,
            "Bool" => Self::Bool,
            "Int" => Self::Int,
            "Float" => Self::Float,
            "Number" => Self::Number,
            "Str" => Self::Str,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Nothing => "Nothing",
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Number => "Number",
            Self::Str => "Str",
        }
    }

    pub const fn is_abstract(self) -> bool {
        matches!(self, Self::Number)
    }

    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Nothing, Value::Nothing)
                | (Self::Bool, Value::Bool(_))
                | (Self::Int, Value::Int(_))
                | (Self::Float, Value::Float(_))
                | (Self::Number, Value::Int(_) | Value::Float(_))
                | (Self::Str, Value::Str(_))
        )
    }

    pub fn is_subtype_of(self, other: Prim) -> bool {
        self == other || (other == Self::Number && matches!(self, Self::Int | Self::Float))
    }
}

// =============================================================================
// TypeExpr
// =============================================================================

/// A field, parameter or bound type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// Untyped: accepts every value.
    Any,
    Prim(Prim),
    /// A node of the type graph by name. A concrete class name accepts only
    /// instances of that class; a marker name accepts every descendant.
    Named(Atom),
    /// A type parameter of the class being described.
    Param(Atom),
    List(Box<TypeExpr>),
}

impl TypeExpr {
    pub const NOTHING: TypeExpr = TypeExpr::Prim(Prim::Nothing);
    pub const BOOL: TypeExpr = TypeExpr::Prim(Prim::Bool);
    pub const INT: TypeExpr = TypeExpr::Prim(Prim::Int);
    pub const FLOAT: TypeExpr = TypeExpr::Prim(Prim::Float);
    pub const NUMBER: TypeExpr = TypeExpr::Prim(Prim::Number);
    pub const STR: TypeExpr = TypeExpr::Prim(Prim::Str);

    pub fn list(element: TypeExpr) -> Self {
        Self::List(Box::new(element))
    }

    /// Build a type from a bare name: `Any`, a primitive, or a graph node.
    pub fn from_name(interner: &Interner, name: &str) -> Self {
        if name == "Any" {
            return Self::Any;
        }
        match Prim::from_name(name) {
            Some(prim) => Self::Prim(prim),
            None => Self::Named(interner.intern(name)),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Replace every parameter the substitution knows about.
    pub fn substitute(&self, subst: &TypeSubstitution) -> TypeExpr {
        match self {
            Self::Param(name) => subst.get(*name).cloned().unwrap_or_else(|| self.clone()),
            Self::List(element) => Self::list(element.substitute(subst)),
            _ => self.clone(),
        }
    }

    pub fn display(&self, interner: &Interner) -> String {
        match self {
            Self::Any => "Any".to_string(),
            Self::Prim(prim) => prim.name().to_string(),
            Self::Named(name) | Self::Param(name) => interner.resolve(*name).to_string(),
            Self::List(element) => format!("List{{{}}}", element.display(interner)),
        }
    }
}

// =============================================================================
// Declarations
// =============================================================================

/// `name <: bound` for one type parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WhereClause {
    pub name: Atom,
    pub bound: TypeExpr,
}

impl WhereClause {
    pub fn new(name: Atom, bound: TypeExpr) -> Self {
        Self { name, bound }
    }

    pub fn unbounded(name: Atom) -> Self {
        Self::new(name, TypeExpr::Any)
    }
}

/// A named, typed slot: a class field or a constructor parameter.
/// Untyped declarations carry `TypeExpr::Any`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldDecl {
    pub name: Atom,
    pub ty: TypeExpr,
}

impl FieldDecl {
    pub fn new(name: Atom, ty: TypeExpr) -> Self {
        Self { name, ty }
    }
}

// =============================================================================
// TypeSubstitution
// =============================================================================

/// Mapping from type parameter names to types.
///
/// Used both for hygienic renaming (name → fresh `Param`) and for binding a
/// class's parameters to the type arguments of an instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeSubstitution {
    map: FxHashMap<Atom, TypeExpr>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `params` positionally to `args`. Extra entries on either side are
    /// ignored; callers check arity first.
    pub fn from_args(params: &[WhereClause], args: &[TypeExpr]) -> Self {
        let mut subst = Self::new();
        for (clause, arg) in params.iter().zip(args) {
            subst.insert(clause.name, arg.clone());
        }
        subst
    }

    pub fn insert(&mut self, name: Atom, ty: TypeExpr) {
        self.map.insert(name, ty);
    }

    pub fn get(&self, name: Atom) -> Option<&TypeExpr> {
        self.map.get(&name)
    }

    pub fn contains(&self, name: Atom) -> bool {
        self.map.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Atom, &TypeExpr)> {
        self.map.iter().map(|(name, ty)| (*name, ty))
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
