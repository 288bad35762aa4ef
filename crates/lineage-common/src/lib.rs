//! Common types and utilities for the lineage class registry.
//!
//! This crate provides foundational types used across all lineage crates:
//! - Name interning (`Atom`, `Interner`)
//! - Registry limits and naming defaults

// Name interning for class, field and type parameter identifiers
pub mod interner;
pub use interner::{Atom, Interner};

// Centralized limits and defaults
pub mod limits;
