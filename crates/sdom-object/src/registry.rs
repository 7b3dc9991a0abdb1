//! Process-wide subclass registry for declared object types.
//!
//! Populated as types are declared and never pruned. Guards are held only
//! for the registry operation itself, never while a schema is resolved.

use std::sync::OnceLock;

use parking_lot::RwLock;

use sdom_registry::SubclassRegistry;

use crate::object_type::TypeDecl;

pub(crate) type TypeRegistry = SubclassRegistry<TypeDecl>;

pub(crate) fn registry() -> &'static RwLock<TypeRegistry> {
    static REGISTRY: OnceLock<RwLock<TypeRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(SubclassRegistry::new()))
}

/// Number of registered names across all families.
pub fn registered_count() -> usize {
    registry().read().len()
}
