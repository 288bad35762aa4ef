//! Runtime values and class instances.

use indexmap::IndexMap;
use lineage_common::Atom;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;

use crate::types::{FieldDecl, TypeExpr, TypeId, TypeSubstitution, WhereClause};

/// A dynamically typed value stored in a field or passed to a constructor.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nothing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(Vec<Value>),
    Object(Arc<Instance>),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Object(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Self::Nothing)
    }

    /// Short description of the value's shape, for diagnostics.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Nothing => "Nothing",
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::Str(_) => "Str",
            Self::List(_) => "List",
            Self::Object(_) => "object",
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(Arc::from(v))
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Self::Object(Arc::new(instance))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

// =============================================================================
// ClassLayout
// =============================================================================

/// Storage layout of a concrete class: every ancestor field followed by the
/// class's own fields, plus the full parameter list.
#[derive(Debug, PartialEq)]
pub struct ClassLayout {
    pub class: TypeId,
    pub name: Atom,
    pub mutable: bool,
    /// Ancestor parameters (hygienically renamed) followed by local ones.
    pub type_params: Vec<WhereClause>,
    pub fields: IndexMap<Atom, TypeExpr, FxBuildHasher>,
    /// Number of leading fields inherited from ancestors.
    pub inherited: usize,
}

impl ClassLayout {
    pub(crate) fn new(
        class: TypeId,
        name: Atom,
        mutable: bool,
        type_params: Vec<WhereClause>,
        fields: Vec<FieldDecl>,
        inherited: usize,
    ) -> Self {
        Self {
            class,
            name,
            mutable,
            type_params,
            fields: fields.into_iter().map(|f| (f.name, f.ty)).collect(),
            inherited,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_index(&self, name: Atom) -> Option<usize> {
        self.fields.get_index_of(&name)
    }

    /// Fields declared by the class itself.
    pub fn local_fields(&self) -> impl Iterator<Item = (&Atom, &TypeExpr)> {
        self.fields.iter().skip(self.inherited)
    }

    pub fn local_len(&self) -> usize {
        self.fields.len() - self.inherited
    }
}

// =============================================================================
// Instance
// =============================================================================

/// An instance of a concrete class.
///
/// Field values are stored positionally in layout order, so an instance of a
/// subclass stores its ancestors' fields at the same positions the ancestors
/// do.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    layout: Arc<ClassLayout>,
    type_args: Vec<TypeExpr>,
    fields: Vec<Value>,
}

impl Instance {
    pub(crate) fn new(
        layout: Arc<ClassLayout>,
        type_args: Vec<TypeExpr>,
        fields: Vec<Value>,
    ) -> Self {
        debug_assert_eq!(layout.fields.len(), fields.len());
        debug_assert_eq!(layout.type_params.len(), type_args.len());
        Self {
            layout,
            type_args,
            fields,
        }
    }

    pub fn class(&self) -> TypeId {
        self.layout.class
    }

    pub fn layout(&self) -> &Arc<ClassLayout> {
        &self.layout
    }

    pub fn is_mutable(&self) -> bool {
        self.layout.mutable
    }

    pub fn type_args(&self) -> &[TypeExpr] {
        &self.type_args
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<Value> {
        self.fields
    }

    pub fn get(&self, name: Atom) -> Option<&Value> {
        self.layout
            .field_index(name)
            .and_then(|index| self.fields.get(index))
    }

    pub fn field_at(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.fields.get_mut(index)
    }

    /// The class's parameters bound to this instance's type arguments.
    pub fn substitution(&self) -> TypeSubstitution {
        TypeSubstitution::from_args(&self.layout.type_params, &self.type_args)
    }
}
