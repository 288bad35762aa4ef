//! Errors raised by class definition, construction and reflection.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassError {
    /// A class body entry, field, parameter or constructor is malformed.
    /// Nothing of the class is registered.
    #[error("invalid definition of class `{class}`: {msg}")]
    Definition { class: String, msg: String },

    #[error("unknown superclass `{superclass}` for class `{class}`")]
    UnknownSuperclass { class: String, superclass: String },

    #[error("type `{0}` is already defined")]
    DuplicateClass(String),

    #[error("unknown class `{0}`")]
    UnknownClass(String),

    #[error("`{0}` is not a class")]
    NotAClass(String),

    #[error("`{0}` is not a concrete class")]
    NotAConcreteClass(String),

    /// `classof` found zero or several concrete realizations of a marker.
    #[error(
        "cannot determine the concrete class of `{marker}`: candidates [{}]",
        join_names(.candidates)
    )]
    AmbiguousConcreteClass {
        marker: String,
        candidates: Vec<String>,
    },

    #[error(
        "no constructor of `{class}` accepts {arity} argument(s){}",
        parametrized_suffix(.parametrized)
    )]
    NoMatchingConstructor {
        class: String,
        arity: usize,
        parametrized: bool,
    },

    #[error("field `{field}` of `{class}` expects {expected}, got {found}")]
    TypeMismatch {
        class: String,
        field: String,
        expected: String,
        found: String,
    },

    #[error(
        "type parameter `{param}` of `{class}` is bound to {actual}, \
         which is not a subtype of {bound}"
    )]
    BoundViolation {
        class: String,
        param: String,
        actual: String,
        bound: String,
    },

    #[error("cannot determine type parameter `{param}` of `{class}` from the given values")]
    UnresolvedTypeParameter { class: String, param: String },

    #[error("`{class}` expects {expected} type argument(s), got {got}")]
    TypeArgumentCount {
        class: String,
        expected: usize,
        got: usize,
    },

    #[error("instances of `{0}` are immutable")]
    Immutable(String),

    #[error("an instance of `{instance}` is not an instance of `{class}`")]
    NotAnInstance { class: String, instance: String },

    #[error("`{class}` has no field `{field}`")]
    UnknownField { class: String, field: String },

    #[error("constructor calls nested deeper than {0} levels")]
    ConstructorDepthExceeded(u32),

    #[error("the hierarchy above `{class}` is deeper than {limit} levels")]
    HierarchyDepthExceeded { class: String, limit: u32 },

    #[error("a constructor of `{class}` returned an instance of `{returned}`")]
    ConstructorResult { class: String, returned: String },

    /// Raised by user constructor bodies.
    #[error("constructor of `{class}` failed: {msg}")]
    Body { class: String, msg: String },

    #[error("invalid registry options: {0}")]
    Options(#[from] serde_json::Error),

    #[error("invalid registry options: {0}")]
    InvalidOptions(String),
}

pub type Result<T, E = ClassError> = std::result::Result<T, E>;

fn join_names(names: &[String]) -> String {
    names.join(", ")
}

fn parametrized_suffix(parametrized: &bool) -> &'static str {
    if *parametrized {
        " with explicit type arguments"
    } else {
        ""
    }
}
