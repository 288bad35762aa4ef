//! Constructor dispatch and instance initialization.
//!
//! `construct` picks the most specific constructor of a class whose
//! signature accepts the arguments and runs it. The kinds of constructor are
//! executed here:
//!
//! - `Default` type-checks the values against the layout and allocates;
//! - `CopyExtend` copies the fields and type arguments of a superclass
//!   instance and appends the local values;
//! - `User` runs the body with a `ConstructorCx`;
//! - `Guide` runs a superclass constructor and re-labels the result.
//!
//! No registry lock is held while a user body runs, so bodies may construct,
//! define and reflect freely.

use std::sync::Arc;
use tracing::trace;

use crate::conformance::TypeChecker;
use crate::constructors::{ConstructorCx, ConstructorKind};
use crate::errors::{ClassError, Result};
use crate::registry::{ClassDef, ClassRegistry};
use crate::types::{TypeExpr, TypeId, TypeSubstitution};
use crate::values::{Instance, Value};

impl ClassRegistry {
    /// `Class(args…)`: type arguments are inferred from the values.
    pub fn construct(&self, class: TypeId, args: Vec<Value>) -> Result<Instance> {
        self.dispatch(class, None, args, 0)
    }

    /// `Class{type_args…}(args…)`.
    pub fn construct_parametric(
        &self,
        class: TypeId,
        type_args: Vec<TypeExpr>,
        args: Vec<Value>,
    ) -> Result<Instance> {
        self.dispatch(class, Some(type_args), args, 0)
    }

    pub(crate) fn dispatch(
        &self,
        class: TypeId,
        type_args: Option<Vec<TypeExpr>>,
        args: Vec<Value>,
        depth: u32,
    ) -> Result<Instance> {
        let def = self.concrete_def(class)?;
        let params = &def.layout.type_params;
        let explicit = match &type_args {
            Some(type_args) => {
                if type_args.len() != params.len() {
                    return Err(ClassError::TypeArgumentCount {
                        class: self.resolve(def.name).to_string(),
                        expected: params.len(),
                        got: type_args.len(),
                    });
                }
                Some(TypeSubstitution::from_args(params, type_args))
            }
            None => None,
        };

        let selected = {
            let graph = self.graph();
            let checker = TypeChecker::new(&graph);
            if let Some(clause) = explicit
                .as_ref()
                .and_then(|explicit| checker.bounds_hold(params, explicit))
            {
                let actual = explicit
                    .as_ref()
                    .and_then(|explicit| explicit.get(clause.name))
                    .map(|ty| self.format_type(ty))
                    .unwrap_or_default();
                return Err(ClassError::BoundViolation {
                    class: self.resolve(def.name).to_string(),
                    param: self.resolve(clause.name).to_string(),
                    actual,
                    bound: self.format_type(&clause.bound),
                });
            }

            let mut best: Option<(usize, u32)> = None;
            for (index, ctor) in def.constructors.iter().enumerate() {
                let signature = &ctor.signature;
                if signature.parametrized != type_args.is_some()
                    || signature.arity() != args.len()
                {
                    continue;
                }
                let mut bindings = explicit.clone().unwrap_or_default();
                if !checker.match_params(&signature.params, &args, &mut bindings)
                    || checker.bounds_hold(params, &bindings).is_some()
                {
                    continue;
                }
                let score = signature
                    .params
                    .iter()
                    .map(|param| checker.specificity(&param.ty))
                    .sum::<u32>();
                // Strictly greater: ties keep the earlier declaration.
                if best.is_none_or(|(_, top)| score > top) {
                    best = Some((index, score));
                }
            }
            best
        };

        let Some((index, score)) = selected else {
            return Err(ClassError::NoMatchingConstructor {
                class: self.resolve(def.name).to_string(),
                arity: args.len(),
                parametrized: type_args.is_some(),
            });
        };
        trace!(
            class = %self.resolve(def.name),
            index,
            score,
            kind = ?def.constructors[index].kind,
            "dispatch"
        );
        self.invoke(&def, index, type_args, args, depth)
    }

    fn invoke(
        &self,
        def: &Arc<ClassDef>,
        index: usize,
        type_args: Option<Vec<TypeExpr>>,
        args: Vec<Value>,
        depth: u32,
    ) -> Result<Instance> {
        let limit = self.options().max_constructor_depth;
        if depth >= limit {
            return Err(ClassError::ConstructorDepthExceeded(limit));
        }
        let Some(ctor) = def.constructors.get(index) else {
            return Err(ClassError::NoMatchingConstructor {
                class: self.resolve(def.name).to_string(),
                arity: args.len(),
                parametrized: type_args.is_some(),
            });
        };

        match &ctor.kind {
            ConstructorKind::Default => self.instantiate(def, type_args, None, args),
            ConstructorKind::CopyExtend => {
                let mut args = args.into_iter();
                let parent = match args.next() {
                    Some(Value::Object(parent)) => parent,
                    other => {
                        return Err(ClassError::TypeMismatch {
                            class: self.resolve(def.name).to_string(),
                            field: "_super".to_string(),
                            expected: self.describe_superclass(def),
                            found: other.map_or_else(String::new, |v| self.describe_value(&v)),
                        });
                    }
                };
                let inherited = parent.type_args().len().min(def.layout.type_params.len());
                let seed = TypeSubstitution::from_args(
                    &def.layout.type_params[..inherited],
                    parent.type_args(),
                );
                let mut values = parent.fields().to_vec();
                values.extend(args);
                self.instantiate(def, None, Some(seed), values)
            }
            ConstructorKind::User(body) => {
                let body = Arc::clone(body);
                let cx = ConstructorCx {
                    registry: self,
                    class: def.id,
                    type_args,
                    depth: depth + 1,
                };
                let instance = body(&cx, args)?;
                if instance.class() != def.id {
                    return Err(ClassError::ConstructorResult {
                        class: self.resolve(def.name).to_string(),
                        returned: self.resolve(instance.layout().name).to_string(),
                    });
                }
                Ok(instance)
            }
            ConstructorKind::Guide(parent_index) => {
                let parent_id = def
                    .superclass
                    .ok_or_else(|| ClassError::NotAClass(self.resolve(def.name).to_string()))?;
                let parent = self.concrete_def(parent_id)?;
                let parent_len = parent.layout.type_params.len();
                let parent_args = type_args
                    .as_ref()
                    .map(|type_args| type_args[..parent_len.min(type_args.len())].to_vec());
                let result = self.invoke(&parent, *parent_index, parent_args, args, depth + 1)?;
                let seed = TypeSubstitution::from_args(
                    &def.layout.type_params[..parent_len.min(def.layout.type_params.len())],
                    result.type_args(),
                );
                self.instantiate(def, type_args, Some(seed), result.into_fields())
            }
        }
    }

    /// Type-check `values` against the layout of `def` and allocate.
    ///
    /// Explicit `type_args` win over `seed`; parameters still unbound after
    /// matching every field are an error.
    pub(crate) fn instantiate(
        &self,
        def: &ClassDef,
        type_args: Option<Vec<TypeExpr>>,
        seed: Option<TypeSubstitution>,
        values: Vec<Value>,
    ) -> Result<Instance> {
        let layout = &def.layout;
        let class = || self.resolve(def.name).to_string();
        if values.len() != layout.len() {
            return Err(ClassError::NoMatchingConstructor {
                class: class(),
                arity: values.len(),
                parametrized: type_args.is_some(),
            });
        }

        let mut bindings = seed.unwrap_or_default();
        if let Some(type_args) = &type_args {
            if type_args.len() != layout.type_params.len() {
                return Err(ClassError::TypeArgumentCount {
                    class: class(),
                    expected: layout.type_params.len(),
                    got: type_args.len(),
                });
            }
            for (clause, arg) in layout.type_params.iter().zip(type_args) {
                bindings.insert(clause.name, arg.clone());
            }
        }

        {
            let graph = self.graph();
            let checker = TypeChecker::new(&graph);
            for ((name, ty), value) in layout.fields.iter().zip(&values) {
                if !checker.match_value(ty, value, &mut bindings) {
                    return Err(ClassError::TypeMismatch {
                        class: class(),
                        field: self.resolve(*name).to_string(),
                        expected: self.format_type(&ty.substitute(&bindings)),
                        found: self.describe_value(value),
                    });
                }
            }
            for clause in &layout.type_params {
                if !bindings.contains(clause.name) {
                    return Err(ClassError::UnresolvedTypeParameter {
                        class: class(),
                        param: self.resolve(clause.name).to_string(),
                    });
                }
            }
            if let Some(clause) = checker.bounds_hold(&layout.type_params, &bindings) {
                return Err(ClassError::BoundViolation {
                    class: class(),
                    param: self.resolve(clause.name).to_string(),
                    actual: bindings
                        .get(clause.name)
                        .map(|ty| self.format_type(ty))
                        .unwrap_or_default(),
                    bound: self.format_type(&clause.bound),
                });
            }
        }

        let type_args = layout
            .type_params
            .iter()
            .map(|clause| bindings.get(clause.name).cloned().unwrap_or(TypeExpr::Any))
            .collect();
        Ok(Instance::new(Arc::clone(layout), type_args, values))
    }

    // =========================================================================
    // Mutable instances
    // =========================================================================

    /// An uninitialized instance of a mutable class: every field `Nothing`,
    /// every type argument `Any`.
    pub fn allocate(&self, class: TypeId) -> Result<Instance> {
        let def = self.concrete_def(class)?;
        if !def.layout.mutable {
            return Err(ClassError::Immutable(self.resolve(def.name).to_string()));
        }
        Ok(Instance::new(
            Arc::clone(&def.layout),
            vec![TypeExpr::Any; def.layout.type_params.len()],
            vec![Value::Nothing; def.layout.len()],
        ))
    }

    /// Full initializer of `class`: assign every field `class` declares or
    /// inherits. `instance` may be of `class` or any descendant.
    pub fn initialize(
        &self,
        instance: &mut Instance,
        class: TypeId,
        values: Vec<Value>,
    ) -> Result<()> {
        let def = self.initializer_target(instance, class)?;
        self.assign(instance, &def, 0, values)
    }

    /// Local initializer of `class`: assign only the fields `class` itself
    /// declares. For a direct child of the root this is the full initializer.
    pub fn initialize_local(
        &self,
        instance: &mut Instance,
        class: TypeId,
        values: Vec<Value>,
    ) -> Result<()> {
        let def = self.initializer_target(instance, class)?;
        let start = if def.local_initializer {
            def.layout.inherited
        } else {
            0
        };
        self.assign(instance, &def, start, values)
    }

    pub fn set_field(&self, instance: &mut Instance, field: &str, value: Value) -> Result<()> {
        if !instance.is_mutable() {
            return Err(ClassError::Immutable(
                self.resolve(instance.layout().name).to_string(),
            ));
        }
        let index = self.field_index(instance, field)?;
        self.check_slot(instance, index, &value)?;
        if let Some(slot) = instance.slot_mut(index) {
            *slot = value;
        }
        Ok(())
    }

    pub fn field<'i>(&self, instance: &'i Instance, field: &str) -> Result<&'i Value> {
        let index = self.field_index(instance, field)?;
        instance
            .field_at(index)
            .ok_or_else(|| self.unknown_field(instance, field))
    }

    fn initializer_target(&self, instance: &Instance, class: TypeId) -> Result<Arc<ClassDef>> {
        let def = self.concrete_def(class)?;
        if !self.issubclass(class, instance.class()) {
            return Err(ClassError::NotAnInstance {
                class: self.resolve(def.name).to_string(),
                instance: self.resolve(instance.layout().name).to_string(),
            });
        }
        if !instance.is_mutable() {
            return Err(ClassError::Immutable(
                self.resolve(instance.layout().name).to_string(),
            ));
        }
        Ok(def)
    }

    fn assign(
        &self,
        instance: &mut Instance,
        def: &ClassDef,
        start: usize,
        values: Vec<Value>,
    ) -> Result<()> {
        let end = def.layout.len();
        if values.len() != end - start {
            return Err(ClassError::NoMatchingConstructor {
                class: self.resolve(def.name).to_string(),
                arity: values.len() + 1,
                parametrized: false,
            });
        }
        for (offset, value) in values.iter().enumerate() {
            self.check_slot(instance, start + offset, value)?;
        }
        for (offset, value) in values.into_iter().enumerate() {
            if let Some(slot) = instance.slot_mut(start + offset) {
                *slot = value;
            }
        }
        Ok(())
    }

    /// Check `value` against the declared type of slot `index`, with the
    /// instance's own type arguments substituted.
    fn check_slot(&self, instance: &Instance, index: usize, value: &Value) -> Result<()> {
        let layout = instance.layout();
        let Some((name, ty)) = layout.fields.get_index(index) else {
            return Err(ClassError::UnknownField {
                class: self.resolve(layout.name).to_string(),
                field: index.to_string(),
            });
        };
        let mut bindings = instance.substitution();
        let ok = {
            let graph = self.graph();
            TypeChecker::new(&graph).match_value(ty, value, &mut bindings)
        };
        if ok {
            Ok(())
        } else {
            Err(ClassError::TypeMismatch {
                class: self.resolve(layout.name).to_string(),
                field: self.resolve(*name).to_string(),
                expected: self.format_type(&ty.substitute(&bindings)),
                found: self.describe_value(value),
            })
        }
    }

    fn field_index(&self, instance: &Instance, field: &str) -> Result<usize> {
        self.interner()
            .get(field)
            .and_then(|atom| instance.layout().field_index(atom))
            .ok_or_else(|| self.unknown_field(instance, field))
    }

    fn unknown_field(&self, instance: &Instance, field: &str) -> ClassError {
        ClassError::UnknownField {
            class: self.resolve(instance.layout().name).to_string(),
            field: field.to_string(),
        }
    }

    fn describe_value(&self, value: &Value) -> String {
        match value {
            Value::Object(instance) => self.resolve(instance.layout().name).to_string(),
            other => other.kind_name().to_string(),
        }
    }

    fn describe_superclass(&self, def: &ClassDef) -> String {
        def.superclass
            .and_then(|id| self.class_def(id))
            .map(|parent| self.resolve(parent.name).to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "../tests/dispatch_tests.rs"]
mod tests;
