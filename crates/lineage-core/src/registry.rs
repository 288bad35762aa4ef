//! The class registry.
//!
//! `ClassRegistry` owns everything a set of class definitions produces: the
//! type graph of markers and concrete classes, one `ClassDef` per class and
//! the metadata cache. It is `Send + Sync`; reflective queries and
//! construction may run from many threads while definitions are committed
//! under the graph's write lock.
//!
//! ## Storage
//!
//! | Map | Key | Value |
//! |-----|-----|-------|
//! | `graph` | `TypeId` | marker and concrete nodes, by name |
//! | `classes` | concrete `TypeId` | `ClassDef` |
//! | `markers` | marker `TypeId` | concrete `TypeId` of the class it marks |
//! | `metadata` | `TypeId` | memoized `ClassInfo` |

use dashmap::DashMap;
use lineage_common::{Atom, Interner};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tracing::{debug, trace};

use crate::compiler::{ClassCompiler, CompiledClass, is_identifier};
use crate::constructors::{Constructor, ConstructorInfo, ConstructorRole};
use crate::descriptor::{ClassBuilder, ClassDescriptor, ConstructorBuilder};
use crate::errors::{ClassError, Result};
use crate::graph::{NodeKind, TypeGraph};
use crate::metadata::MetadataStore;
use crate::options::RegistryOptions;
use crate::types::{TypeExpr, TypeId};
use crate::values::ClassLayout;

/// Everything the registry knows about one class.
#[derive(Debug)]
pub struct ClassDef {
    /// Concrete node. `TypeId::ROOT` for the root class.
    pub id: TypeId,
    pub marker: TypeId,
    pub name: Atom,
    pub superclass: Option<TypeId>,
    pub layout: Arc<ClassLayout>,
    /// User constructors first, then the synthesized ones.
    pub constructors: Vec<Constructor>,
    /// Whether `initialize_local` differs from `initialize`.
    pub local_initializer: bool,
}

pub struct ClassRegistry {
    options: RegistryOptions,
    interner: Interner,
    graph: RwLock<TypeGraph>,
    classes: DashMap<TypeId, Arc<ClassDef>>,
    markers: DashMap<TypeId, TypeId>,
    metadata: MetadataStore,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::build(RegistryOptions::default())
    }

    pub fn with_options(options: RegistryOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(options))
    }

    fn build(options: RegistryOptions) -> Self {
        let interner = Interner::new();
        let root_name = interner.intern(&options.root_name);
        let classes = DashMap::new();
        classes.insert(
            TypeId::ROOT,
            Arc::new(ClassDef {
                id: TypeId::ROOT,
                marker: TypeId::ROOT,
                name: root_name,
                superclass: None,
                layout: Arc::new(ClassLayout::new(
                    TypeId::ROOT,
                    root_name,
                    false,
                    Vec::new(),
                    Vec::new(),
                    0,
                )),
                constructors: Vec::new(),
                local_initializer: false,
            }),
        );
        trace!(root = %options.root_name, "ClassRegistry::new");
        Self {
            graph: RwLock::new(TypeGraph::new(root_name)),
            options,
            interner,
            classes,
            markers: DashMap::new(),
            metadata: MetadataStore::new(),
        }
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    // =========================================================================
    // Names
    // =========================================================================

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn intern(&self, name: &str) -> Atom {
        self.interner.intern(name)
    }

    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        self.interner.resolve(atom)
    }

    /// `Any`, a primitive or a graph node, by name.
    pub fn ty(&self, name: &str) -> TypeExpr {
        TypeExpr::from_name(&self.interner, name)
    }

    /// A reference to a type parameter.
    pub fn param(&self, name: &str) -> TypeExpr {
        TypeExpr::Param(self.interner.intern(name))
    }

    pub fn class(&self, name: &str) -> ClassBuilder<'_> {
        ClassBuilder::new(&self.interner, name)
    }

    pub fn constructor(&self, name: &str) -> ConstructorBuilder<'_> {
        ConstructorBuilder::new(&self.interner, name)
    }

    pub fn format_type(&self, ty: &TypeExpr) -> String {
        ty.display(&self.interner)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Any graph node by name: class, marker or declared type.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        let atom = self.interner.get(name)?;
        self.graph().lookup(atom)
    }

    /// A class (the root or a concrete class) by name.
    pub fn class_id(&self, name: &str) -> Result<TypeId> {
        self.lookup(name)
            .filter(|id| self.classes.contains_key(id))
            .ok_or_else(|| ClassError::UnknownClass(name.to_string()))
    }

    pub fn name_of(&self, id: TypeId) -> Option<Arc<str>> {
        let name = self.graph().name(id)?;
        Some(self.interner.resolve(name))
    }

    pub(crate) fn type_name(&self, id: TypeId) -> String {
        self.name_of(id)
            .map_or_else(|| format!("<type {}>", id.0), |name| name.to_string())
    }

    pub fn class_def(&self, id: TypeId) -> Option<Arc<ClassDef>> {
        self.classes.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// The definition of an instantiable class.
    pub(crate) fn concrete_def(&self, id: TypeId) -> Result<Arc<ClassDef>> {
        if let Some(def) = self.class_def(id).filter(|def| !def.id.is_root()) {
            return Ok(def);
        }
        let is_abstract = self.graph().is_abstract(id);
        if is_abstract {
            Err(ClassError::NotAConcreteClass(self.type_name(id)))
        } else {
            Err(ClassError::NotAClass(self.type_name(id)))
        }
    }

    /// The class a marker was emitted for.
    pub(crate) fn marker_owner(&self, marker: TypeId) -> Option<TypeId> {
        self.markers.get(&marker).map(|entry| *entry.value())
    }

    pub(crate) fn graph(&self) -> RwLockReadGuard<'_, TypeGraph> {
        self.graph.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn layout(&self, class: TypeId) -> Result<Arc<ClassLayout>> {
        self.class_def(class)
            .map(|def| Arc::clone(&def.layout))
            .ok_or_else(|| ClassError::NotAClass(self.type_name(class)))
    }

    pub fn field_names(&self, class: TypeId) -> Result<Vec<Arc<str>>> {
        let layout = self.layout(class)?;
        Ok(layout
            .fields
            .keys()
            .map(|name| self.interner.resolve(*name))
            .collect())
    }

    /// Every way to build or fill an instance of `class`, in dispatch order,
    /// followed by its initializers.
    pub fn constructors(&self, class: TypeId) -> Result<Vec<ConstructorInfo>> {
        let def = self.concrete_def(class)?;
        let mut out: Vec<ConstructorInfo> = def
            .constructors
            .iter()
            .map(|ctor| ConstructorInfo {
                role: ctor.role(),
                arity: ctor.signature.arity(),
                parametrized: ctor.signature.parametrized,
            })
            .collect();
        out.push(ConstructorInfo {
            role: ConstructorRole::FullInitializer,
            arity: 1 + def.layout.len(),
            parametrized: false,
        });
        if def.local_initializer {
            out.push(ConstructorInfo {
                role: ConstructorRole::LocalInitializer,
                arity: 1 + def.layout.local_len(),
                parametrized: false,
            });
        }
        Ok(out)
    }

    /// Number of defined classes, not counting the root.
    pub fn len(&self) -> usize {
        self.classes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// Add an abstract type outside the class machinery. With a supertype it
    /// joins that hierarchy; without one it is a free-standing root.
    pub fn declare_abstract_type(&self, name: &str, supertype: Option<TypeId>) -> Result<TypeId> {
        self.declare_type(name, NodeKind::Abstract, supertype)
    }

    /// Add a concrete type below an abstract one, e.g. a hand-written
    /// realization of a class marker.
    pub fn declare_concrete_type(&self, name: &str, supertype: TypeId) -> Result<TypeId> {
        self.declare_type(name, NodeKind::Concrete, Some(supertype))
    }

    fn declare_type(
        &self,
        name: &str,
        kind: NodeKind,
        supertype: Option<TypeId>,
    ) -> Result<TypeId> {
        if !is_identifier(name) {
            return Err(ClassError::Definition {
                class: name.to_string(),
                msg: "not a valid type name".to_string(),
            });
        }
        let atom = self.interner.intern(name);
        let mut graph = self.graph.write().unwrap_or_else(PoisonError::into_inner);
        if graph.lookup(atom).is_some() {
            return Err(ClassError::DuplicateClass(name.to_string()));
        }
        if let Some(sup) = supertype.filter(|sup| !graph.is_abstract(*sup)) {
            let sup_name = graph.name(sup).map_or_else(
                || format!("<type {}>", sup.0),
                |n| self.interner.resolve(n).to_string(),
            );
            return Err(ClassError::Definition {
                class: name.to_string(),
                msg: format!("supertype `{sup_name}` is not an abstract type"),
            });
        }
        let id = graph.add(atom, kind, supertype);
        debug!(name, type_id = id.0, ?kind, "declared type");
        Ok(id)
    }

    /// Compile and register a class. Returns the concrete class.
    ///
    /// All-or-nothing: on error nothing of the class is registered.
    #[tracing::instrument(
        level = "debug",
        skip(self, descriptor),
        fields(class = %self.resolve(descriptor.name))
    )]
    pub fn define(&self, descriptor: ClassDescriptor) -> Result<TypeId> {
        let compiled = ClassCompiler::new(self).compile(descriptor)?;
        self.commit(compiled)
    }

    fn commit(&self, compiled: CompiledClass) -> Result<TypeId> {
        let mut graph = self.graph.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have taken either name since compilation.
        for name in [compiled.name, compiled.marker_name] {
            if graph.lookup(name).is_some() {
                return Err(ClassError::DuplicateClass(
                    self.interner.resolve(name).to_string(),
                ));
            }
        }
        let super_marker = self
            .class_def(compiled.superclass)
            .map_or(TypeId::ROOT, |def| def.marker);

        let marker = graph.add(compiled.marker_name, NodeKind::Abstract, Some(super_marker));
        let id = graph.add(compiled.name, NodeKind::Concrete, Some(marker));
        let layout = Arc::new(ClassLayout::new(
            id,
            compiled.name,
            compiled.mutable,
            compiled.type_params,
            compiled.fields,
            compiled.inherited,
        ));

        debug!(
            class = %self.interner.resolve(compiled.name),
            type_id = id.0,
            marker = marker.0,
            superclass = compiled.superclass.0,
            fields = layout.len(),
            constructors = compiled.constructors.len(),
            "defined class"
        );

        self.classes.insert(
            id,
            Arc::new(ClassDef {
                id,
                marker,
                name: compiled.name,
                superclass: Some(compiled.superclass),
                layout,
                constructors: compiled.constructors,
                local_initializer: compiled.local_initializer,
            }),
        );
        self.markers.insert(marker, id);
        Ok(id)
    }
}

#[cfg(test)]
#[path = "../tests/registry_tests.rs"]
mod tests;
