//! Class-definition compiler.
//!
//! Turns a `ClassDescriptor` into a `CompiledClass`: the merged parameter
//! list and field layout, and the ordered constructor set. Nothing touches
//! the type graph here; `ClassRegistry::define` commits the result under the
//! graph's write lock, so a class that fails to compile leaves no trace.
//!
//! ## Field algebra
//!
//! ```text
//! params = info(super).where_clauses ++ local params
//! fields = info(super).fields        ++ local fields
//! ```
//!
//! `info` has already renamed every inherited parameter, so a local parameter
//! may reuse an ancestor's name without aliasing it.
//!
//! ## Constructor set
//!
//! In dispatch order:
//!
//! 1. user constructors, as written;
//! 2. the default constructor over every field, un-parametrized and (for
//!    generic classes) parametrized;
//! 3. copy-and-extend, when the class inherits fields;
//! 4. guides, when the class adds no fields to a non-root superclass: one per
//!    non-default superclass constructor, same shape, forwarding to it.

use lineage_common::Atom;
use lineage_common::limits::HYGIENE_SEPARATOR;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::trace;

use crate::constructors::{Constructor, ConstructorKind, Signature};
use crate::descriptor::{BodyEntry, ClassDescriptor, ConstructorDef};
use crate::errors::{ClassError, Result};
use crate::graph::TypeGraph;
use crate::metadata::ClassInfo;
use crate::registry::{ClassDef, ClassRegistry};
use crate::types::{FieldDecl, TypeExpr, TypeId, WhereClause};

/// Name of the superclass-instance parameter of copy-and-extend.
const SUPER_PARAM: &str = "_super";

/// A class ready to be committed.
#[derive(Debug)]
pub struct CompiledClass {
    pub name: Atom,
    pub marker_name: Atom,
    pub superclass: TypeId,
    pub mutable: bool,
    pub type_params: Vec<WhereClause>,
    pub fields: Vec<FieldDecl>,
    pub inherited: usize,
    pub constructors: Vec<Constructor>,
    pub local_initializer: bool,
}

pub struct ClassCompiler<'r> {
    registry: &'r ClassRegistry,
}

impl<'r> ClassCompiler<'r> {
    pub fn new(registry: &'r ClassRegistry) -> Self {
        Self { registry }
    }

    pub fn compile(&self, descriptor: ClassDescriptor) -> Result<CompiledClass> {
        let ClassDescriptor {
            name,
            superclass,
            type_params: local_params,
            mutable,
            body,
        } = descriptor;
        let class_name = self.registry.resolve(name).to_string();
        if !is_identifier(&class_name) {
            return Err(definition(&class_name, "the class name is not an identifier"));
        }
        let marker_name = self
            .registry
            .intern(&format!("{}{}", self.registry.options().marker_prefix, class_name));

        {
            let graph = self.registry.graph();
            if graph.lookup(name).is_some() {
                return Err(ClassError::DuplicateClass(class_name));
            }
            if graph.lookup(marker_name).is_some() {
                return Err(ClassError::DuplicateClass(
                    self.registry.resolve(marker_name).to_string(),
                ));
            }
        }

        for clause in &local_params {
            if !is_identifier(&self.registry.resolve(clause.name)) {
                return Err(definition(
                    &class_name,
                    format!(
                        "type parameter `{}` is not an identifier",
                        self.registry.resolve(clause.name)
                    ),
                ));
            }
        }

        let super_def = self.resolve_superclass(&class_name, superclass)?;
        let depth = self.registry.superclasses(super_def.id)?.len() + 1;
        let limit = self.registry.options().max_hierarchy_depth;
        if depth > limit as usize {
            return Err(definition(
                &class_name,
                format!("inheritance depth {depth} exceeds the limit of {limit}"),
            ));
        }
        let (local_fields, user_ctors) = partition_body(&class_name, name, body)?;

        let super_info = self.registry.info(super_def.id)?;
        let type_params = merge_params(&class_name, &super_info, local_params)?;
        let inherited = super_info.fields.len();
        let fields = merge_fields(&class_name, &super_info, local_fields)?;

        {
            let graph = self.registry.graph();
            let checker = TypeNameCheck {
                graph: &graph,
                class: &class_name,
                own: [name, marker_name],
                params: type_params.iter().map(|clause| clause.name).collect(),
                registry: self.registry,
            };
            for clause in &type_params[super_info.where_clauses.len()..] {
                checker.check(&clause.bound)?;
            }
            for field in &fields[inherited..] {
                checker.check(&field.ty)?;
            }
            for ctor in &user_ctors {
                for param in &ctor.params {
                    checker.check(&param.ty)?;
                }
            }
        }

        let mut constructors = Vec::new();
        for ctor in user_ctors {
            if ctor.parametrized && type_params.is_empty() {
                return Err(definition(
                    &class_name,
                    "a parametrized constructor needs type parameters",
                ));
            }
            constructors.push(Constructor::new(
                Signature::new(ctor.params, ctor.parametrized),
                ConstructorKind::User(ctor.body),
            ));
        }

        constructors.push(Constructor::new(
            Signature::new(fields.clone(), false),
            ConstructorKind::Default,
        ));
        if !type_params.is_empty() {
            constructors.push(Constructor::new(
                Signature::new(fields.clone(), true),
                ConstructorKind::Default,
            ));
        }

        if inherited > 0 {
            let mut params = vec![FieldDecl::new(
                self.registry.intern(SUPER_PARAM),
                TypeExpr::Named(super_def.name),
            )];
            params.extend_from_slice(&fields[inherited..]);
            constructors.push(Constructor::new(
                Signature::new(params, false),
                ConstructorKind::CopyExtend,
            ));
        }

        if fields.len() == inherited && !super_def.id.is_root() {
            self.push_guides(&super_def, &super_info, &mut constructors);
        }

        trace!(
            class = %class_name,
            params = type_params.len(),
            fields = fields.len(),
            inherited,
            constructors = constructors.len(),
            "compiled class"
        );

        Ok(CompiledClass {
            name,
            marker_name,
            superclass: super_def.id,
            mutable,
            type_params,
            fields,
            inherited,
            constructors,
            local_initializer: inherited > 0,
        })
    }

    fn resolve_superclass(&self, class: &str, superclass: Option<Atom>) -> Result<Arc<ClassDef>> {
        let Some(atom) = superclass else {
            return self
                .registry
                .class_def(TypeId::ROOT)
                .ok_or_else(|| ClassError::UnknownClass(self.registry.options().root_name.clone()));
        };
        let id = self.registry.graph().lookup(atom);
        id.and_then(|id| self.registry.class_def(id))
            .ok_or_else(|| ClassError::UnknownSuperclass {
                class: class.to_string(),
                superclass: self.registry.resolve(atom).to_string(),
            })
    }

    /// Re-expose every non-default superclass constructor with the same
    /// shape, its parameter types rewritten into this class's parameter names.
    fn push_guides(
        &self,
        super_def: &ClassDef,
        super_info: &ClassInfo,
        out: &mut Vec<Constructor>,
    ) {
        for (index, parent) in super_def.constructors.iter().enumerate() {
            if parent.is_default() {
                continue;
            }
            let params = parent
                .signature
                .params
                .iter()
                .map(|param| {
                    FieldDecl::new(param.name, param.ty.substitute(&super_info.substitution))
                })
                .collect();
            out.push(Constructor::new(
                Signature::new(params, parent.signature.parametrized),
                ConstructorKind::Guide(index),
            ));
        }
    }
}

fn definition(class: &str, msg: impl Into<String>) -> ClassError {
    ClassError::Definition {
        class: class.to_string(),
        msg: msg.into(),
    }
}

/// A letter or `_`, then letters, digits or `_`.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && !name.contains(HYGIENE_SEPARATOR)
}

fn partition_body(
    class: &str,
    name: Atom,
    body: Vec<BodyEntry>,
) -> Result<(Vec<FieldDecl>, Vec<ConstructorDef>)> {
    let mut fields = Vec::new();
    let mut ctors = Vec::new();
    for entry in body {
        match entry {
            BodyEntry::Field(field) => fields.push(field),
            BodyEntry::Constructor(ctor) if ctor.name == name => {
                let mut seen = FxHashSet::default();
                if !ctor.params.iter().all(|param| seen.insert(param.name)) {
                    return Err(definition(class, "duplicate constructor parameter"));
                }
                ctors.push(ctor);
            }
            BodyEntry::Constructor(_) => {
                return Err(definition(
                    class,
                    "only constructors of the class itself may appear in its body",
                ));
            }
            BodyEntry::Statement(text) => {
                return Err(definition(class, format!("unexpected statement `{text}`")));
            }
        }
    }
    Ok((fields, ctors))
}

fn merge_params(
    class: &str,
    super_info: &ClassInfo,
    local: Vec<WhereClause>,
) -> Result<Vec<WhereClause>> {
    let mut params = super_info.where_clauses.clone();
    for clause in local {
        if params.iter().any(|existing| existing.name == clause.name) {
            return Err(definition(class, "duplicate type parameter"));
        }
        params.push(clause);
    }
    Ok(params)
}

fn merge_fields(
    class: &str,
    super_info: &ClassInfo,
    local: Vec<FieldDecl>,
) -> Result<Vec<FieldDecl>> {
    let mut fields = super_info.fields.clone();
    for field in local {
        if fields.iter().any(|existing| existing.name == field.name) {
            return Err(definition(class, "a field reuses an existing field name"));
        }
        fields.push(field);
    }
    Ok(fields)
}

/// Every name in a declared type must be a known graph node, the class being
/// defined, or one of its parameters.
struct TypeNameCheck<'a> {
    graph: &'a TypeGraph,
    class: &'a str,
    own: [Atom; 2],
    params: Vec<Atom>,
    registry: &'a ClassRegistry,
}

impl TypeNameCheck<'_> {
    fn check(&self, ty: &TypeExpr) -> Result<()> {
        match ty {
            TypeExpr::Any | TypeExpr::Prim(_) => Ok(()),
            TypeExpr::Named(name) => {
                if self.own.contains(name) || self.graph.lookup(*name).is_some() {
                    Ok(())
                } else {
                    Err(definition(
                        self.class,
                        format!("unknown type `{}`", self.registry.resolve(*name)),
                    ))
                }
            }
            TypeExpr::Param(name) => {
                if self.params.contains(name) {
                    Ok(())
                } else {
                    Err(definition(
                        self.class,
                        format!("undeclared type parameter `{}`", self.registry.resolve(*name)),
                    ))
                }
            }
            TypeExpr::List(element) => self.check(element),
        }
    }
}

#[cfg(test)]
#[path = "../tests/compiler_tests.rs"]
mod tests;
