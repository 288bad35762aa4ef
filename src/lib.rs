//! lineage: single-inheritance class hierarchies on a runtime type graph.
//!
//! ```ignore
//! use lineage::{ClassRegistry, TypeExpr, Value};
//!
//! let registry = ClassRegistry::new();
//! let foo = registry.define(registry.class("Foo").field("foo", TypeExpr::INT).build())?;
//! let bar = registry.define(
//!     registry.class("Bar").extends("Foo").field("bar", TypeExpr::INT).build(),
//! )?;
//!
//! let b = registry.construct(bar, vec![Value::Int(1), Value::Int(2)])?;
//! assert_eq!(registry.superclass(bar)?, Some(foo));
//! assert!(registry.issubclass(foo, bar));
//! ```
//!
//! The implementation lives in `lineage-core`; names are interned by
//! `lineage-common`.

pub mod tracing_config;

pub use lineage_common::{Atom, Interner, limits};
pub use lineage_core::*;
