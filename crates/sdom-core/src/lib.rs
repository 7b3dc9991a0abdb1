//! # sdom-core: Foundational Types for sdom
//!
//! This crate is the leaf of the workspace dependency graph. It defines the
//! error taxonomy every other crate reports through, and the helpers that
//! move plain data (JSON/YAML-shaped values) in and out of text.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sdom-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod plain;

// Re-export primary types for ergonomic imports.
pub use error::{
    ConstructionError, DomError, KeyError, ValidationError, ValueError, Violation, Violations,
};
pub use plain::{describe, parse_json, parse_yaml, yaml_to_json_value};
