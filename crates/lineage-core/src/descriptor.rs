//! Declarative class descriptions.
//!
//! A `ClassDescriptor` is what a front-end hands to `ClassRegistry::define`.
//! It is consumed once; the builders below are the in-process way to write
//! one:
//!
//! ```ignore
//! let bar = registry.define(
//!     registry
//!         .class("Bar")
//!         .extends("Foo")
//!         .field("bar", TypeExpr::INT)
//!         .build(),
//! )?;
//! ```

use lineage_common::{Atom, Interner};
use std::fmt;
use std::sync::Arc;

use crate::constructors::{ConstructorBody, ConstructorCx};
use crate::errors::Result;
use crate::types::{FieldDecl, TypeExpr, WhereClause};
use crate::values::{Instance, Value};

#[derive(Debug)]
pub struct ClassDescriptor {
    pub name: Atom,
    /// `None` derives from the root class.
    pub superclass: Option<Atom>,
    /// Parameters declared by this class, in order.
    pub type_params: Vec<WhereClause>,
    pub mutable: bool,
    pub body: Vec<BodyEntry>,
}

/// One entry of a class body as handed over by a front-end.
#[derive(Debug)]
pub enum BodyEntry {
    Field(FieldDecl),
    Constructor(ConstructorDef),
    /// Anything the front-end could not classify. Always rejected.
    Statement(String),
}

/// A user-written constructor.
///
/// `name` is the function being defined and must be the class's own name.
/// Parameter types may mention the class's type parameters; a `parametrized`
/// constructor is called with explicit type arguments (`Foo{Int}(…)`), the
/// others infer them from the argument values.
pub struct ConstructorDef {
    pub name: Atom,
    pub params: Vec<FieldDecl>,
    pub parametrized: bool,
    pub body: ConstructorBody,
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("parametrized", &self.parametrized)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Builders
// =============================================================================

pub struct ClassBuilder<'r> {
    interner: &'r Interner,
    descriptor: ClassDescriptor,
}

impl<'r> ClassBuilder<'r> {
    pub fn new(interner: &'r Interner, name: &str) -> Self {
        Self {
            interner,
            descriptor: ClassDescriptor {
                name: interner.intern(name),
                superclass: None,
                type_params: Vec::new(),
                mutable: false,
                body: Vec::new(),
            },
        }
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.descriptor.superclass = Some(self.interner.intern(superclass));
        self
    }

    pub fn type_param(mut self, name: &str, bound: TypeExpr) -> Self {
        self.descriptor
            .type_params
            .push(WhereClause::new(self.interner.intern(name), bound));
        self
    }

    pub fn mutable(mut self) -> Self {
        self.descriptor.mutable = true;
        self
    }

    pub fn field(mut self, name: &str, ty: TypeExpr) -> Self {
        self.descriptor
            .body
            .push(BodyEntry::Field(FieldDecl::new(self.interner.intern(name), ty)));
        self
    }

    pub fn untyped_field(self, name: &str) -> Self {
        self.field(name, TypeExpr::Any)
    }

    pub fn constructor(mut self, def: ConstructorDef) -> Self {
        self.descriptor.body.push(BodyEntry::Constructor(def));
        self
    }

    pub fn statement(mut self, text: impl Into<String>) -> Self {
        self.descriptor.body.push(BodyEntry::Statement(text.into()));
        self
    }

    pub fn build(self) -> ClassDescriptor {
        self.descriptor
    }
}

pub struct ConstructorBuilder<'r> {
    interner: &'r Interner,
    name: Atom,
    params: Vec<FieldDecl>,
    parametrized: bool,
}

impl<'r> ConstructorBuilder<'r> {
    pub fn new(interner: &'r Interner, name: &str) -> Self {
        Self {
            interner,
            name: interner.intern(name),
            params: Vec::new(),
            parametrized: false,
        }
    }

    pub fn param(mut self, name: &str, ty: TypeExpr) -> Self {
        self.params.push(FieldDecl::new(self.interner.intern(name), ty));
        self
    }

    pub fn untyped_param(self, name: &str) -> Self {
        self.param(name, TypeExpr::Any)
    }

    /// Require explicit type arguments at the call site.
    pub fn parametric(mut self) -> Self {
        self.parametrized = true;
        self
    }

    pub fn body<F>(self, body: F) -> ConstructorDef
    where
        F: Fn(&ConstructorCx<'_>, Vec<Value>) -> Result<Instance> + Send + Sync + 'static,
    {
        ConstructorDef {
            name: self.name,
            params: self.params,
            parametrized: self.parametrized,
            body: Arc::new(body),
        }
    }
}
