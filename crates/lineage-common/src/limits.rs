//! Centralized limits and naming defaults for the class registry.
//!
//! These are the defaults behind `RegistryOptions`; a registry built with
//! `RegistryOptions::default()` uses exactly these values.

// =============================================================================
// Recursion limits
// =============================================================================

/// Maximum nesting of constructor calls.
///
/// A user constructor may re-dispatch to another constructor of its class
/// (`Animal(x, y, z) = Animal(x + y + z)`), and guide constructors forward to
/// their superclass. A body that keeps re-dispatching to itself is cut off at
/// this depth instead of overflowing the stack.
pub const MAX_CONSTRUCTOR_DEPTH: u32 = 64;

/// Maximum inheritance depth: the number of ancestors a class may have,
/// root included.
///
/// `define` rejects a class that would exceed it, and ancestor walks fail
/// rather than return a cut-off chain.
pub const MAX_HIERARCHY_DEPTH: u32 = 256;

// =============================================================================
// Naming
// =============================================================================

/// Name of the root class every hierarchy terminates in.
pub const DEFAULT_ROOT_NAME: &str = "Class";

/// Prefix for the abstract marker of a class: `Foo` gets `AbstractFoo`.
pub const DEFAULT_MARKER_PREFIX: &str = "Abstract";

/// Separator between a type parameter's base name and its hygiene generation.
///
/// Declared parameter names may not contain it, so a renamed parameter can
/// never collide with a declared one.
pub const HYGIENE_SEPARATOR: char = '#';
