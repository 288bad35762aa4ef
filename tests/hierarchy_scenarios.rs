//! End-to-end hierarchy scenarios through the public API.

use lineage::{
    ClassError, ClassRegistry, ConstructorRole, Instance, TypeExpr, TypeId, Value,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn field(registry: &ClassRegistry, instance: &Instance, name: &str) -> Value {
    registry
        .field(instance, name)
        .expect("field exists")
        .clone()
}

fn foo_bar_baz(registry: &ClassRegistry) -> [TypeId; 3] {
    let foo = registry
        .define(registry.class("Foo").field("foo", TypeExpr::INT).build())
        .expect("Foo");
    let bar = registry
        .define(registry.class("Bar").extends("Foo").field("bar", TypeExpr::INT).build())
        .expect("Bar");
    let baz = registry
        .define(registry.class("Baz").extends("Bar").field("baz", TypeExpr::INT).build())
        .expect("Baz");
    [foo, bar, baz]
}

#[test]
fn scenario_three_level_hierarchy() {
    let registry = ClassRegistry::new();
    let [foo, bar, baz] = foo_bar_baz(&registry);

    assert_eq!(
        registry.superclasses(baz).expect("superclasses").to_vec(),
        vec![bar, foo, TypeId::ROOT]
    );
    assert_eq!(registry.subclasses(foo).expect("subclasses"), vec![bar, baz]);

    let instance = registry
        .construct(baz, vec![Value::Int(100), Value::Int(101), Value::Int(102)])
        .expect("Baz(100, 101, 102)");
    assert_eq!(field(&registry, &instance, "foo"), Value::Int(100));
    assert_eq!(field(&registry, &instance, "bar"), Value::Int(101));
    assert_eq!(field(&registry, &instance, "baz"), Value::Int(102));
}

#[test]
fn scenario_ambiguous_marker() {
    let registry = ClassRegistry::new();
    let [foo, ..] = foo_bar_baz(&registry);
    let marker = registry.absclass(foo).expect("AbstractFoo");
    registry
        .declare_concrete_type("HandWrittenFoo", marker)
        .expect("manual realization");

    let err = registry.classof(marker).expect_err("two realizations");
    assert!(matches!(
        err,
        ClassError::AmbiguousConcreteClass { ref candidates, .. } if candidates.len() == 2
    ));
    assert!(err.to_string().contains("HandWrittenFoo"));
}

#[test]
fn scenario_guide_reproduces_superclass_computation() {
    let registry = ClassRegistry::new();
    let sum = registry
        .constructor("Animal")
        .param("x", TypeExpr::INT)
        .param("y", TypeExpr::INT)
        .param("z", TypeExpr::INT)
        .body(|cx, args| {
            let total: i64 = args.iter().filter_map(Value::as_int).sum();
            cx.call(vec![Value::Int(total)])
        });
    let animal = registry
        .define(registry.class("Animal").untyped_field("x").constructor(sum).build())
        .expect("Animal");
    let dog = registry
        .define(registry.class("Dog").extends("Animal").build())
        .expect("Dog");

    let rex = registry
        .construct(dog, vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        .expect("Dog(1, 2, 3)");
    assert_eq!(rex.class(), dog);
    assert_eq!(field(&registry, &rex, "x"), Value::Int(6));

    let generic = registry
        .construct(animal, vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        .expect("Animal(1, 2, 3)");
    assert_eq!(generic.fields(), rex.fields());
}

#[test]
fn scenario_generic_guides() {
    let registry = ClassRegistry::new();
    let t = registry.param("T");
    let sum = registry
        .constructor("Wrapper")
        .param("x", t.clone())
        .param("y", t.clone())
        .body(|cx, args| {
            let value = match (&args[0], &args[1]) {
                (Value::Int(a), Value::Int(b)) => Value::Int(a + b),
                (Value::Float(a), Value::Float(b)) => Value::Float(a + b),
                _ => Value::Nothing,
            };
            cx.new_instance(vec![value])
        });
    let product = registry
        .constructor("Wrapper")
        .param("x", t.clone())
        .param("y", t.clone())
        .parametric()
        .body(|cx, args| {
            let value = match (&args[0], &args[1]) {
                (Value::Int(a), Value::Int(b)) => Value::Int(a * b),
                (Value::Float(a), Value::Float(b)) => Value::Float(a * b),
                _ => Value::Nothing,
            };
            cx.new_instance(vec![value])
        });
    registry
        .define(
            registry
                .class("Wrapper")
                .type_param("T", TypeExpr::NUMBER)
                .field("value", t)
                .constructor(sum)
                .constructor(product)
                .build(),
        )
        .expect("Wrapper");
    let boxed = registry
        .define(registry.class("Boxed").extends("Wrapper").build())
        .expect("Boxed");

    let inferred = registry
        .construct(boxed, vec![Value::Int(1), Value::Int(2)])
        .expect("Boxed(1, 2)");
    assert_eq!(inferred.class(), boxed);
    assert_eq!(field(&registry, &inferred, "value"), Value::Int(3));
    assert_eq!(inferred.type_args(), &[TypeExpr::INT]);

    let explicit = registry
        .construct_parametric(
            boxed,
            vec![TypeExpr::FLOAT],
            vec![Value::Float(2.0), Value::Float(3.0)],
        )
        .expect("Boxed{Float}(2.0, 3.0)");
    assert_eq!(explicit.class(), boxed);
    assert_eq!(field(&registry, &explicit, "value"), Value::Float(6.0));
    assert_eq!(explicit.type_args(), &[TypeExpr::FLOAT]);

    let guides = registry
        .constructors(boxed)
        .expect("listing")
        .into_iter()
        .filter(|info| info.role == ConstructorRole::Guide)
        .map(|info| info.parametrized)
        .collect::<Vec<_>>();
    assert_eq!(guides, vec![false, true]);

    assert!(matches!(
        registry.construct(boxed, vec![Value::from("a"), Value::from("b")]),
        Err(ClassError::NoMatchingConstructor { .. })
    ));
}

#[test]
fn scenario_guide_side_effect_runs_once() {
    let registry = ClassRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let noisy = registry
        .constructor("Base")
        .param("n", TypeExpr::INT)
        .body(move |cx, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            cx.new_instance(Vec::new())
        });
    registry
        .define(registry.class("Base").constructor(noisy).build())
        .expect("Base");
    let derived = registry
        .define(registry.class("Derived").extends("Base").build())
        .expect("Derived");

    for expected in 1..=3 {
        let instance = registry
            .construct(derived, vec![Value::Int(0)])
            .expect("Derived(0)");
        assert_eq!(instance.class(), derived);
        assert_eq!(calls.load(Ordering::SeqCst), expected);
    }
}

#[test]
fn property_fields_extend_the_superclass_layout() {
    let registry = ClassRegistry::new();
    let classes = foo_bar_baz(&registry);
    for class in classes {
        let names = registry.field_names(class).expect("fields");
        let parent = registry.superclass(class).expect("superclass").expect("not root");
        let parent_names = registry.field_names(parent).expect("parent fields");
        assert_eq!(&names[..parent_names.len()], parent_names.as_slice());
        assert_eq!(names.len(), parent_names.len() + 1);
    }
}

#[test]
fn property_issubclass_convention() {
    let registry = ClassRegistry::new();
    let classes = foo_bar_baz(&registry);
    for class in classes {
        assert!(registry.issubclass(class, class));
        assert!(registry.issubclass(TypeId::ROOT, class));
        assert!(!registry.issubclass(class, TypeId::ROOT));
        assert_eq!(
            registry.classof(registry.absclass(class).expect("marker")).expect("classof"),
            class
        );
    }
}

#[test]
fn property_copy_and_extend_preserves_ancestors() {
    let registry = ClassRegistry::new();
    let [foo, bar, baz] = foo_bar_baz(&registry);
    let b = registry
        .construct(bar, vec![Value::Int(7), Value::Int(8)])
        .expect("Bar");
    let z = registry
        .construct(baz, vec![Value::from(b.clone()), Value::Int(9)])
        .expect("Baz from Bar");
    assert_eq!(&z.fields()[..2], b.fields());
    assert_eq!(field(&registry, &z, "baz"), Value::Int(9));

    let f = registry.construct(foo, vec![Value::Int(1)]).expect("Foo");
    let from_foo = registry
        .construct(bar, vec![Value::from(f), Value::Int(2)])
        .expect("Bar from Foo");
    assert_eq!(field(&registry, &from_foo, "foo"), Value::Int(1));
}
