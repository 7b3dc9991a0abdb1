//! # sdom-registry: Subclass Registration
//!
//! A generic, namespace-scoped registry of declared subtypes. Declared
//! object types register here so that a base type can enumerate the
//! subtypes declared after it and so that a registered name can be resolved
//! back to a type.
//!
//! The registry is a plain value; the process-wide instance used by
//! declared object types lives in `sdom-object` behind a lock.
//!
//! ## Crate Policy
//!
//! - Depends only on `sdom-core` internally.
//! - Types are compared by identity, never by name.
//! - Entries are never removed.

pub mod registry;

pub use registry::{NamespaceKey, RegisteredType, SubclassRegistry};
