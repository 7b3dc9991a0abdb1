//! # sdom-schema: Schema Nodes, Compiler and Validated DOM
//!
//! Provides the schema algebra, its compilation to Draft-07 JSON Schema, and
//! the document tree that schemas build.
//!
//! ## Schema nodes (`node`, `scalar`, `object`, `array`, `any_of`)
//!
//! [`SchemaNode`] is a tagged union of primitive, `null`, constant,
//! enumeration, pattern, anything, object, array, dict, union and provided
//! rules. Each node can describe itself as JSON Schema, validate a raw value,
//! and accept a raw value into an [`Element`].
//!
//! ## Compiler (`compile`)
//!
//! [`SchemaNode::full_schema`] emits a standalone document with every named
//! node under `definitions`. [`SchemaNode::validate`] and
//! [`SchemaNode::check`] run it through the `jsonschema` crate.
//!
//! ## DOM (`dom`)
//!
//! Object, list and dict elements know their schema, their parent, their
//! document root and their key. Every mutation re-validates.
//!
//! ## Crate Policy
//!
//! - Depends only on `sdom-core` internally.
//! - A tree never contains a value its schema rejected; failed operations
//!   leave the tree unchanged.
//! - Unions and enumerations never pick the first of several matches.

pub mod any_of;
pub mod array;
pub mod compile;
pub mod dom;
pub mod node;
pub mod object;
pub mod scalar;

pub use any_of::AnyOfSchema;
pub use array::ArraySchema;
pub use compile::{definition_ref, pointer_escape, DRAFT_07};
pub use dom::{DictElement, DomInfo, Element, ListElement, ObjectElement, Position, Walk};
pub use node::{Additional, DeclaredType, PrimitiveKind, SchemaNode, SchemaProvider};
pub use object::{DictSchema, ObjectSchema};
pub use scalar::{EnumMember, EnumSchema, PatternSchema};
