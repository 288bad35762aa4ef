use super::*;

fn add(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => Value::Int(a + b),
        (Value::Float(a), Value::Float(b)) => Value::Float(a + b),
        _ => Value::Nothing,
    }
}

fn int_field(registry: &ClassRegistry, instance: &Instance, name: &str) -> i64 {
    registry
        .field(instance, name)
        .expect("field exists")
        .as_int()
        .expect("integer field")
}

fn foo_bar(registry: &ClassRegistry) -> (TypeId, TypeId) {
    let foo = registry
        .define(registry.class("Foo").field("foo", TypeExpr::INT).build())
        .expect("Foo");
    let bar = registry
        .define(registry.class("Bar").extends("Foo").field("bar", TypeExpr::STR).build())
        .expect("Bar");
    (foo, bar)
}

#[test]
fn test_default_constructor_type_checks() {
    let registry = ClassRegistry::new();
    let (_, bar) = foo_bar(&registry);

    let ok = registry
        .construct(bar, vec![Value::Int(1), Value::from("one")])
        .expect("valid values");
    assert_eq!(int_field(&registry, &ok, "foo"), 1);
    assert_eq!(registry.field(&ok, "bar").expect("bar").as_str(), Some("one"));

    let err = registry
        .construct(bar, vec![Value::from("one"), Value::Int(1)])
        .expect_err("swapped values");
    assert!(matches!(err, ClassError::NoMatchingConstructor { arity: 2, .. }));
}

#[test]
fn test_copy_and_extend_keeps_ancestor_values() {
    let registry = ClassRegistry::new();
    let (foo, bar) = foo_bar(&registry);
    let parent = registry.construct(foo, vec![Value::Int(42)]).expect("Foo");

    let child = registry
        .construct(bar, vec![Value::from(parent), Value::from("extended")])
        .expect("copy and extend");
    assert_eq!(child.class(), bar);
    assert_eq!(int_field(&registry, &child, "foo"), 42);
    assert_eq!(registry.field(&child, "bar").expect("bar").as_str(), Some("extended"));
}

#[test]
fn test_copy_and_extend_requires_the_direct_superclass() {
    let registry = ClassRegistry::new();
    let (_, bar) = foo_bar(&registry);
    let baz = registry
        .define(registry.class("Baz").extends("Bar").field("baz", TypeExpr::INT).build())
        .expect("Baz");
    let bar_value = registry
        .construct(bar, vec![Value::Int(1), Value::from("b")])
        .expect("Bar");
    let baz_value = registry
        .construct(baz, vec![Value::from(bar_value), Value::Int(3)])
        .expect("from Bar");
    assert_eq!(int_field(&registry, &baz_value, "baz"), 3);

    // A Baz is not a Bar instance.
    let err = registry
        .construct(baz, vec![Value::from(baz_value), Value::Int(4)])
        .expect_err("wrong parent");
    assert!(matches!(err, ClassError::NoMatchingConstructor { .. }));
}

#[test]
fn test_user_constructor_redispatches() {
    let registry = ClassRegistry::new();
    let sum = registry
        .constructor("Animal")
        .untyped_param("x")
        .untyped_param("y")
        .untyped_param("z")
        .body(|cx, args| cx.call(vec![add(&add(&args[0], &args[1]), &args[2])]));
    let animal = registry
        .define(registry.class("Animal").untyped_field("x").constructor(sum).build())
        .expect("Animal");

    let instance = registry
        .construct(animal, vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        .expect("Animal(1, 2, 3)");
    assert_eq!(int_field(&registry, &instance, "x"), 6);
}

#[test]
fn test_most_specific_constructor_wins() {
    let registry = ClassRegistry::new();
    let by_int = registry
        .constructor("Pick")
        .param("n", TypeExpr::INT)
        .body(|cx, _| cx.new_instance(vec![Value::from("int")]));
    let by_any = registry
        .constructor("Pick")
        .untyped_param("n")
        .body(|cx, _| cx.new_instance(vec![Value::from("any")]));
    let pick = registry
        .define(
            registry
                .class("Pick")
                .field("chosen", TypeExpr::STR)
                .constructor(by_any)
                .constructor(by_int)
                .build(),
        )
        .expect("Pick");

    let int = registry.construct(pick, vec![Value::Int(1)]).expect("Int");
    assert_eq!(registry.field(&int, "chosen").expect("chosen").as_str(), Some("int"));
    let float = registry.construct(pick, vec![Value::Float(1.0)]).expect("Float");
    assert_eq!(registry.field(&float, "chosen").expect("chosen").as_str(), Some("any"));
    // A string matches the untyped constructor and the default (Str) one;
    // the default is more specific.
    let text = registry.construct(pick, vec![Value::from("x")]).expect("Str");
    assert_eq!(registry.field(&text, "chosen").expect("chosen").as_str(), Some("x"));
}

#[test]
fn test_constructor_must_return_its_class() {
    let registry = ClassRegistry::new();
    let other = registry
        .define(registry.class("Other").build())
        .expect("Other");
    let wrong = registry
        .constructor("Liar")
        .param("n", TypeExpr::INT)
        .body(move |cx, _| cx.registry().construct(other, Vec::new()));
    let liar = registry
        .define(registry.class("Liar").constructor(wrong).build())
        .expect("Liar");

    let err = registry
        .construct(liar, vec![Value::Int(1)])
        .expect_err("returns Other");
    assert!(matches!(err, ClassError::ConstructorResult { returned, .. } if returned == "Other"));
}

#[test]
fn test_runaway_recursion_is_cut_off() {
    let registry = ClassRegistry::new();
    let forever = registry
        .constructor("Loop")
        .param("n", TypeExpr::INT)
        .body(|cx, args| cx.call(args));
    let looping = registry
        .define(registry.class("Loop").constructor(forever).build())
        .expect("Loop");

    let err = registry
        .construct(looping, vec![Value::Int(0)])
        .expect_err("recursion");
    assert!(matches!(err, ClassError::ConstructorDepthExceeded(64)));
}

#[test]
fn test_body_errors_propagate() {
    let registry = ClassRegistry::new();
    let failing = registry
        .constructor("Strict")
        .param("n", TypeExpr::INT)
        .body(|_, _| {
            Err(ClassError::Body {
                class: "Strict".to_string(),
                msg: "negative".to_string(),
            })
        });
    let strict = registry
        .define(registry.class("Strict").constructor(failing).build())
        .expect("Strict");
    assert!(matches!(
        registry.construct(strict, vec![Value::Int(-1)]),
        Err(ClassError::Body { .. })
    ));
}

#[test]
fn test_type_parameters_are_inferred_and_bounded() {
    let registry = ClassRegistry::new();
    let t = registry.param("T");
    let pair = registry
        .define(
            registry
                .class("Pair")
                .type_param("T", TypeExpr::NUMBER)
                .field("a", t.clone())
                .field("b", t)
                .build(),
        )
        .expect("Pair");

    let ints = registry
        .construct(pair, vec![Value::Int(1), Value::Int(2)])
        .expect("Pair{Int}");
    assert_eq!(ints.type_args(), &[TypeExpr::INT]);

    let mixed = registry.construct(pair, vec![Value::Int(1), Value::Float(2.0)]);
    assert!(matches!(mixed, Err(ClassError::NoMatchingConstructor { .. })));

    let strings = registry.construct(pair, vec![Value::from("a"), Value::from("b")]);
    assert!(matches!(strings, Err(ClassError::NoMatchingConstructor { .. })));

    let explicit = registry
        .construct_parametric(pair, vec![TypeExpr::NUMBER], vec![Value::Int(1), Value::Float(2.0)])
        .expect("Pair{Number}");
    assert_eq!(explicit.type_args(), &[TypeExpr::NUMBER]);

    assert!(matches!(
        registry.construct_parametric(
            pair,
            vec![TypeExpr::STR],
            vec![Value::from("a"), Value::from("b")]
        ),
        Err(ClassError::BoundViolation { .. })
    ));
    assert!(matches!(
        registry.construct_parametric(pair, Vec::new(), vec![Value::Int(1), Value::Int(2)]),
        Err(ClassError::TypeArgumentCount { expected: 1, got: 0, .. })
    ));
}

#[test]
fn test_unresolved_parameter() {
    let registry = ClassRegistry::new();
    let phantom = registry
        .define(
            registry
                .class("Phantom")
                .type_param("T", TypeExpr::Any)
                .field("x", TypeExpr::INT)
                .build(),
        )
        .expect("Phantom");
    assert!(matches!(
        registry.construct(phantom, vec![Value::Int(1)]),
        Err(ClassError::UnresolvedTypeParameter { .. })
    ));
    let tagged = registry
        .construct_parametric(phantom, vec![TypeExpr::STR], vec![Value::Int(1)])
        .expect("explicit");
    assert_eq!(tagged.type_args(), &[TypeExpr::STR]);
}

#[test]
fn test_new_instance_reports_type_mismatch() {
    let registry = ClassRegistry::new();
    let bad = registry
        .constructor("Typed")
        .body(|cx, _| cx.new_instance(vec![Value::from("not an int")]));
    let typed = registry
        .define(
            registry
                .class("Typed")
                .field("n", TypeExpr::INT)
                .constructor(bad)
                .build(),
        )
        .expect("Typed");
    let err = registry.construct(typed, Vec::new()).expect_err("mismatch");
    assert!(matches!(
        err,
        ClassError::TypeMismatch { field, expected, found, .. }
            if field == "n" && expected == "Int" && found == "Str"
    ));
}

#[test]
fn test_markers_and_root_cannot_be_constructed() {
    let registry = ClassRegistry::new();
    let (foo, _) = foo_bar(&registry);
    let marker = registry.absclass(foo).expect("marker");
    assert!(matches!(
        registry.construct(marker, vec![Value::Int(1)]),
        Err(ClassError::NotAConcreteClass(_))
    ));
    assert!(matches!(
        registry.construct(TypeId::ROOT, Vec::new()),
        Err(ClassError::NotAConcreteClass(_))
    ));
}

#[test]
fn test_mutable_workflow() {
    let registry = ClassRegistry::new();
    let point = registry
        .define(
            registry
                .class("Point")
                .mutable()
                .field("x", TypeExpr::INT)
                .build(),
        )
        .expect("Point");
    let point3 = registry
        .define(
            registry
                .class("Point3")
                .extends("Point")
                .mutable()
                .field("z", TypeExpr::INT)
                .build(),
        )
        .expect("Point3");

    let mut p = registry.allocate(point3).expect("allocate");
    assert!(p.fields().iter().all(Value::is_nothing));

    registry
        .initialize(&mut p, point, vec![Value::Int(1)])
        .expect("Point's initializer fills the inherited prefix");
    assert_eq!(int_field(&registry, &p, "x"), 1);
    assert!(registry.field(&p, "z").expect("z").is_nothing());
    registry
        .initialize(&mut p, point3, vec![Value::Int(1), Value::Int(3)])
        .expect("full initializer");
    registry
        .initialize_local(&mut p, point3, vec![Value::Int(30)])
        .expect("local initializer");
    registry
        .initialize_local(&mut p, point, vec![Value::Int(10)])
        .expect("root child local = full");
    assert_eq!(int_field(&registry, &p, "x"), 10);
    assert_eq!(int_field(&registry, &p, "z"), 30);

    registry.set_field(&mut p, "z", Value::Int(31)).expect("set z");
    assert_eq!(int_field(&registry, &p, "z"), 31);
    assert!(matches!(
        registry.set_field(&mut p, "z", Value::from("no")),
        Err(ClassError::TypeMismatch { .. })
    ));
    assert!(matches!(
        registry.set_field(&mut p, "w", Value::Int(0)),
        Err(ClassError::UnknownField { .. })
    ));

    let mut flat = registry.allocate(point).expect("allocate Point");
    assert!(matches!(
        registry.initialize(&mut flat, point3, vec![Value::Int(1), Value::Int(2)]),
        Err(ClassError::NotAnInstance { .. })
    ));
}

#[test]
fn test_immutable_instances_reject_writes() {
    let registry = ClassRegistry::new();
    let (foo, _) = foo_bar(&registry);
    assert!(matches!(registry.allocate(foo), Err(ClassError::Immutable(_))));

    let mut value = registry.construct(foo, vec![Value::Int(1)]).expect("Foo");
    assert!(matches!(
        registry.set_field(&mut value, "foo", Value::Int(2)),
        Err(ClassError::Immutable(_))
    ));
    assert!(matches!(
        registry.initialize(&mut value, foo, vec![Value::Int(2)]),
        Err(ClassError::Immutable(_))
    ));
    assert_eq!(int_field(&registry, &value, "foo"), 1);
}
