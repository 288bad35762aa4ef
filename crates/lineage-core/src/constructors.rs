//! Constructor records and the context user constructor bodies run in.
//!
//! Every class carries an ordered list of `Constructor`s: the user's own,
//! followed by those the compiler synthesizes (default, copy-and-extend and
//! guides). Initializers are not stored here; they are fixed operations on
//! `ClassRegistry` (`initialize`, `initialize_local`) and only show up in the
//! `constructors` listing.

use std::fmt;
use std::sync::Arc;

use crate::errors::Result;
use crate::registry::ClassRegistry;
use crate::types::{FieldDecl, TypeExpr, TypeId};
use crate::values::{Instance, Value};

pub type ConstructorBody =
    Arc<dyn Fn(&ConstructorCx<'_>, Vec<Value>) -> Result<Instance> + Send + Sync>;

/// Parameter list of a constructor, expressed in the owning class's
/// (possibly hygienically renamed) type parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Signature {
    pub params: Vec<FieldDecl>,
    /// Called with explicit type arguments.
    pub parametrized: bool,
}

impl Signature {
    pub fn new(params: Vec<FieldDecl>, parametrized: bool) -> Self {
        Self {
            params,
            parametrized,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Clone)]
pub enum ConstructorKind {
    /// Every field value, in layout order.
    Default,
    /// A superclass instance followed by the local field values.
    CopyExtend,
    User(ConstructorBody),
    /// Forward to the superclass constructor at this index and re-label the
    /// result.
    Guide(usize),
}

impl fmt::Debug for ConstructorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::CopyExtend => f.write_str("CopyExtend"),
            Self::User(_) => f.write_str("User(..)"),
            Self::Guide(index) => f.debug_tuple("Guide").field(index).finish(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Constructor {
    pub signature: Signature,
    pub kind: ConstructorKind,
}

impl Constructor {
    pub fn new(signature: Signature, kind: ConstructorKind) -> Self {
        Self { signature, kind }
    }

    pub fn is_default(&self) -> bool {
        matches!(self.kind, ConstructorKind::Default)
    }

    pub fn role(&self) -> ConstructorRole {
        match self.kind {
            ConstructorKind::Default => ConstructorRole::Default,
            ConstructorKind::CopyExtend => ConstructorRole::CopyExtend,
            ConstructorKind::User(_) => ConstructorRole::User,
            ConstructorKind::Guide(_) => ConstructorRole::Guide,
        }
    }
}

// =============================================================================
// Introspection
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConstructorRole {
    User,
    Default,
    CopyExtend,
    Guide,
    FullInitializer,
    LocalInitializer,
}

/// One line of `ClassRegistry::constructors`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConstructorInfo {
    pub role: ConstructorRole,
    /// Initializers count the instance being initialized.
    pub arity: usize,
    pub parametrized: bool,
}

// =============================================================================
// ConstructorCx
// =============================================================================

/// What a user constructor body can see and call.
pub struct ConstructorCx<'r> {
    pub(crate) registry: &'r ClassRegistry,
    pub(crate) class: TypeId,
    pub(crate) type_args: Option<Vec<TypeExpr>>,
    pub(crate) depth: u32,
}

impl<'r> ConstructorCx<'r> {
    /// The class being constructed.
    pub fn class(&self) -> TypeId {
        self.class
    }

    pub fn registry(&self) -> &'r ClassRegistry {
        self.registry
    }

    /// Explicit type arguments of a parametrized call; empty otherwise.
    pub fn type_args(&self) -> &[TypeExpr] {
        self.type_args.as_deref().unwrap_or_default()
    }

    /// Allocate an instance from every field value, like the default
    /// constructor. Type arguments of a parametrized call are kept; otherwise
    /// they are inferred from `values`.
    pub fn new_instance(&self, values: Vec<Value>) -> Result<Instance> {
        let def = self.registry.concrete_def(self.class)?;
        self.registry
            .instantiate(&def, self.type_args.clone(), None, values)
    }

    /// Re-dispatch to any constructor of the class being constructed.
    pub fn call(&self, args: Vec<Value>) -> Result<Instance> {
        self.registry.dispatch(self.class, None, args, self.depth)
    }

    pub fn call_parametric(&self, type_args: Vec<TypeExpr>, args: Vec<Value>) -> Result<Instance> {
        self.registry
            .dispatch(self.class, Some(type_args), args, self.depth)
    }
}
