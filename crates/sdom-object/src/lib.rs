//! # sdom-object: Declared Object Types
//!
//! Runtime declarations of record types on top of `sdom-schema`. A type is
//! declared once with [`ObjectType::builder`], from an ordered list of
//! [`PropertyBuilder`]s, and then builds validated [`UserObject`]s from
//! plain data.
//!
//! ## Polymorphism
//!
//! A type declared with `registers_subclasses` becomes a family root. Its
//! descendants register into a process-wide [`sdom_registry`] instance, and
//! the family's schema is recomputed from that registry on every use, so a
//! subtype declared late is still picked up by schemas taken earlier.
//!
//! ## Adapters
//!
//! [`FromPlainData`] and [`ToPlainData`] move documents in and out as JSON
//! or YAML text and files.
//!
//! ## Crate Policy
//!
//! - Depends on `sdom-core`, `sdom-schema` and `sdom-registry` internally.
//! - Declarations are immutable once built; the registry only grows.
//! - The registry lock is never held while a schema is being resolved.

pub mod adapters;
pub mod object_type;
pub mod property;
pub mod registry;
pub mod user_object;

pub use adapters::{FromPlainData, ToPlainData};
pub use object_type::{ObjectType, ObjectTypeSchema, TypeBuilder};
pub use property::{AttributeBinding, DefaultFn, PropertyBuilder, PropertyType};
pub use registry::registered_count;
pub use user_object::{properties, UserObject};

pub use sdom_core::DomError;
pub use sdom_schema::{Additional, Element, PrimitiveKind, SchemaNode};
