//! Single-inheritance classes on a runtime type graph.
//!
//! A `ClassRegistry` compiles declarative class descriptions into:
//!
//! - an abstract marker per class (`AbstractFoo`), forming a hierarchy that
//!   parallels the classes and accepts every descendant instance;
//! - a concrete, final class whose layout is every ancestor field followed by
//!   its own;
//! - the class's constructors: user bodies, a default constructor,
//!   copy-and-extend from a superclass instance, and guides that re-expose a
//!   superclass's constructors on a subclass adding no fields;
//!
//! and answers reflective queries (`superclass`, `superclasses`, `isclass`,
//! `issubclass`, `classof`, `subclasses`, `absclass`) over the result.
//!
//! Inherited type parameters are renamed hygienically, so a subclass may
//! declare a parameter with an ancestor's name without aliasing it.

pub mod compiler;
mod conformance;
pub mod constructors;
pub mod descriptor;
mod dispatch;
pub mod errors;
pub mod graph;
pub mod hygiene;
pub mod metadata;
pub mod options;
mod reflection;
pub mod registry;
pub mod types;
pub mod values;

pub use constructors::{
    Constructor, ConstructorBody, ConstructorCx, ConstructorInfo, ConstructorKind,
    ConstructorRole, Signature,
};
pub use descriptor::{BodyEntry, ClassBuilder, ClassDescriptor, ConstructorBuilder, ConstructorDef};
pub use errors::{ClassError, Result};
pub use graph::{NodeKind, TypeGraph};
pub use metadata::ClassInfo;
pub use options::RegistryOptions;
pub use registry::{ClassDef, ClassRegistry};
pub use types::{FieldDecl, Prim, TypeExpr, TypeId, TypeSubstitution, WhereClause};
pub use values::{ClassLayout, Instance, Value};

#[cfg(test)]
#[path = "../tests/concurrent_tests.rs"]
mod concurrent_tests;
