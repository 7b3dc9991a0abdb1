//! # Subclass Registry
//!
//! Maps `(namespace, registered name)` to an ordered list of candidate
//! types. A namespace is fixed at a family root: the first type in a lineage
//! that registers its subtypes. Every descendant registers into the root's
//! namespace no matter how deep it sits.
//!
//! ## Candidates
//!
//! [`SubclassRegistry::register`] gives a name its primary type; registering
//! the same type again is a no-op, registering a different one is a naming
//! conflict. [`SubclassRegistry::register_alias`] lets a subtype of the
//! primary share the name. That is the only way a name gets several
//! candidates, and [`SubclassRegistry::lookup`] resolves such a name to the
//! candidate that is an ancestor of all the others.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use sdom_core::KeyError;

/// A type that can be registered: it has a name and knows its ancestry.
pub trait RegisteredType {
    /// Fully-qualified type name.
    fn type_name(&self) -> &str;

    /// Whether `self` is `other` or one of its descendants.
    fn is_subtype_of(&self, other: &Self) -> bool;
}

/// Identifies a registration namespace. Keyed by the family root's
/// qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespaceKey(pub String);

impl NamespaceKey {
    /// The namespace rooted at the type called `root`.
    pub fn new(root: impl Into<String>) -> Self {
        Self(root.into())
    }

    /// The family root's name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Namespace-scoped map from registered name to candidate types.
///
/// Types are compared by identity (`Arc::ptr_eq`), never by name.
pub struct SubclassRegistry<T> {
    namespaces: HashMap<NamespaceKey, IndexMap<String, Vec<Arc<T>>>>,
}

impl<T> Default for SubclassRegistry<T> {
    fn default() -> Self {
        Self {
            namespaces: HashMap::new(),
        }
    }
}

impl<T: RegisteredType> SubclassRegistry<T> {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ty` as the primary type for `name` in `namespace`.
    ///
    /// # Errors
    ///
    /// `KeyError::Conflict` if `name` already maps to a different type.
    pub fn register(
        &mut self,
        namespace: &NamespaceKey,
        name: &str,
        ty: Arc<T>,
    ) -> Result<(), KeyError> {
        let names = self.namespaces.entry(namespace.clone()).or_default();
        if let Some(candidates) = names.get(name) {
            if candidates.iter().any(|c| Arc::ptr_eq(c, &ty)) {
                return Ok(());
            }
            let existing = candidates
                .first()
                .map(|c| c.type_name().to_string())
                .unwrap_or_default();
            return Err(KeyError::Conflict {
                name: name.to_string(),
                existing,
                attempted: ty.type_name().to_string(),
            });
        }
        tracing::debug!(
            namespace = %namespace,
            name,
            type_name = ty.type_name(),
            "registered subclass"
        );
        names.insert(name.to_string(), vec![ty]);
        Ok(())
    }

    /// Add `ty` as a further candidate for an existing `name`. `ty` must be
    /// a subtype of the name's primary type.
    ///
    /// # Errors
    ///
    /// `KeyError::Unknown` if `name` is not registered, `KeyError::Conflict`
    /// if `ty` does not descend from the primary type.
    pub fn register_alias(
        &mut self,
        namespace: &NamespaceKey,
        name: &str,
        ty: Arc<T>,
    ) -> Result<(), KeyError> {
        let candidates = self
            .namespaces
            .get_mut(namespace)
            .and_then(|names| names.get_mut(name))
            .ok_or_else(|| KeyError::Unknown {
                name: name.to_string(),
            })?;
        if candidates.iter().any(|c| Arc::ptr_eq(c, &ty)) {
            return Ok(());
        }
        let Some(primary) = candidates.first() else {
            return Err(KeyError::Unknown {
                name: name.to_string(),
            });
        };
        if !ty.is_subtype_of(primary) {
            return Err(KeyError::Conflict {
                name: name.to_string(),
                existing: primary.type_name().to_string(),
                attempted: ty.type_name().to_string(),
            });
        }
        tracing::debug!(
            namespace = %namespace,
            name,
            type_name = ty.type_name(),
            "registered subclass alias"
        );
        candidates.push(ty);
        Ok(())
    }

    /// Resolve `name` to a proper subtype of `root`.
    ///
    /// With several matching candidates, returns the single one that is an
    /// ancestor of every other.
    ///
    /// # Errors
    ///
    /// `KeyError::Unknown` when nothing matches, `KeyError::Ambiguous` when
    /// no candidate is a common ancestor of the rest.
    pub fn lookup(
        &self,
        namespace: &NamespaceKey,
        name: &str,
        root: &T,
    ) -> Result<Arc<T>, KeyError> {
        let matched: Vec<&Arc<T>> = self
            .namespaces
            .get(namespace)
            .and_then(|names| names.get(name))
            .map(|candidates| {
                candidates
                    .iter()
                    .filter(|c| is_proper_subtype(c, root))
                    .collect()
            })
            .unwrap_or_default();

        match matched.as_slice() {
            [] => Err(KeyError::Unknown {
                name: name.to_string(),
            }),
            [only] => Ok(Arc::clone(only)),
            many => {
                let ancestors: Vec<&&Arc<T>> = many
                    .iter()
                    .filter(|a| many.iter().all(|c| c.is_subtype_of(a)))
                    .collect();
                tracing::trace!(
                    name,
                    candidates = many.len(),
                    common_ancestors = ancestors.len(),
                    "disambiguating registered name"
                );
                match ancestors.as_slice() {
                    [ancestor] => Ok(Arc::clone(ancestor)),
                    _ => Err(KeyError::Ambiguous {
                        name: name.to_string(),
                        candidates: many.iter().map(|c| c.type_name().to_string()).collect(),
                    }),
                }
            }
        }
    }

    /// Per registered name, the proper subtypes of `root` registered in
    /// `namespace`. Names with no such subtype are omitted.
    pub fn subclasses_of(
        &self,
        namespace: &NamespaceKey,
        root: &T,
    ) -> IndexMap<String, Vec<Arc<T>>> {
        let Some(names) = self.namespaces.get(namespace) else {
            return IndexMap::new();
        };
        names
            .iter()
            .filter_map(|(name, candidates)| {
                let matched: Vec<Arc<T>> = candidates
                    .iter()
                    .filter(|c| is_proper_subtype(c, root))
                    .cloned()
                    .collect();
                (!matched.is_empty()).then(|| (name.clone(), matched))
            })
            .collect()
    }

    /// Whether any proper subtype of `root` is registered in `namespace`.
    pub fn has_subclasses(&self, namespace: &NamespaceKey, root: &T) -> bool {
        self.namespaces.get(namespace).is_some_and(|names| {
            names
                .values()
                .flatten()
                .any(|c| is_proper_subtype(c, root))
        })
    }

    /// Registered names in `namespace`, in registration order.
    pub fn names(&self, namespace: &NamespaceKey) -> Vec<String> {
        self.namespaces
            .get(namespace)
            .map(|names| names.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Total number of registered names across all namespaces.
    pub fn len(&self) -> usize {
        self.namespaces.values().map(IndexMap::len).sum()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_proper_subtype<T: RegisteredType>(candidate: &Arc<T>, root: &T) -> bool {
    !std::ptr::eq(candidate.as_ref(), root) && candidate.is_subtype_of(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A toy type: a name plus the names of all its ancestors.
    #[derive(Debug)]
    struct Kind {
        name: &'static str,
        ancestors: Vec<&'static str>,
    }

    impl Kind {
        fn new(name: &'static str, ancestors: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                name,
                ancestors: ancestors.to_vec(),
            })
        }
    }

    impl RegisteredType for Kind {
        fn type_name(&self) -> &str {
            self.name
        }

        fn is_subtype_of(&self, other: &Self) -> bool {
            self.name == other.name || self.ancestors.contains(&other.name)
        }
    }

    fn ns() -> NamespaceKey {
        NamespaceKey::new("zoo.Animal")
    }

    #[test]
    fn test_register_is_idempotent_for_identical_type() {
        let mut registry = SubclassRegistry::new();
        let dog = Kind::new("zoo.Dog", &["zoo.Animal"]);
        registry.register(&ns(), "dog", Arc::clone(&dog)).unwrap();
        registry.register(&ns(), "dog", Arc::clone(&dog)).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(&ns()), vec!["dog"]);
    }

    #[test]
    fn test_register_conflict_for_different_type() {
        let mut registry = SubclassRegistry::new();
        registry
            .register(&ns(), "dog", Kind::new("zoo.Dog", &["zoo.Animal"]))
            .unwrap();
        let err = registry
            .register(&ns(), "dog", Kind::new("zoo.Wolf", &["zoo.Animal"]))
            .unwrap_err();
        match err {
            KeyError::Conflict {
                existing, attempted, ..
            } => {
                assert_eq!(existing, "zoo.Dog");
                assert_eq!(attempted, "zoo.Wolf");
            }
            other => panic!("Expected Conflict, got: {other}"),
        }
    }

    #[test]
    fn test_namespaces_are_independent() {
        let mut registry = SubclassRegistry::new();
        let other = NamespaceKey::new("garage.Vehicle");
        registry
            .register(&ns(), "x", Kind::new("zoo.X", &["zoo.Animal"]))
            .unwrap();
        registry
            .register(&other, "x", Kind::new("garage.X", &["garage.Vehicle"]))
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lookup_filters_to_proper_subtypes() {
        let mut registry = SubclassRegistry::new();
        let animal = Kind::new("zoo.Animal", &[]);
        let pet = Kind::new("zoo.Pet", &["zoo.Animal"]);
        let dog = Kind::new("zoo.Dog", &["zoo.Pet", "zoo.Animal"]);
        registry.register(&ns(), "pet", Arc::clone(&pet)).unwrap();
        registry.register(&ns(), "dog", Arc::clone(&dog)).unwrap();

        let found = registry.lookup(&ns(), "dog", &animal).unwrap();
        assert!(Arc::ptr_eq(&found, &dog));
        assert!(Arc::ptr_eq(&registry.lookup(&ns(), "dog", &pet).unwrap(), &dog));

        // A type is not its own proper subtype.
        let err = registry.lookup(&ns(), "pet", &pet).unwrap_err();
        assert!(matches!(err, KeyError::Unknown { .. }));
        assert!(err.to_string().contains("unknown registered subclass key"));
        assert!(registry.lookup(&ns(), "cat", &animal).is_err());
    }

    #[test]
    fn test_lookup_resolves_common_ancestor() {
        let mut registry = SubclassRegistry::new();
        let animal = Kind::new("zoo.Animal", &[]);
        let dog = Kind::new("zoo.Dog", &["zoo.Animal"]);
        let puppy = Kind::new("zoo.Puppy", &["zoo.Dog", "zoo.Animal"]);
        registry.register(&ns(), "dog", Arc::clone(&dog)).unwrap();
        registry.register_alias(&ns(), "dog", Arc::clone(&puppy)).unwrap();

        let found = registry.lookup(&ns(), "dog", &animal).unwrap();
        assert!(Arc::ptr_eq(&found, &dog));
        // Under the dog root only the puppy is a proper subtype.
        assert!(Arc::ptr_eq(&registry.lookup(&ns(), "dog", &dog).unwrap(), &puppy));
    }

    #[test]
    fn test_lookup_ambiguous_without_common_ancestor() {
        let mut registry = SubclassRegistry::new();
        let animal = Kind::new("zoo.Animal", &[]);
        let dog = Kind::new("zoo.Dog", &["zoo.Animal"]);
        let puppy = Kind::new("zoo.Puppy", &["zoo.Dog", "zoo.Animal"]);
        let hound = Kind::new("zoo.Hound", &["zoo.Dog", "zoo.Animal"]);
        registry.register(&ns(), "dog", Arc::clone(&dog)).unwrap();
        registry.register_alias(&ns(), "dog", puppy).unwrap();
        registry.register_alias(&ns(), "dog", hound).unwrap();

        let err = registry.lookup(&ns(), "dog", &dog).unwrap_err();
        match err {
            KeyError::Ambiguous { candidates, .. } => {
                assert_eq!(candidates, vec!["zoo.Puppy", "zoo.Hound"]);
            }
            other => panic!("Expected Ambiguous, got: {other}"),
        }
        assert!(registry.lookup(&ns(), "dog", &animal).is_ok());
    }

    #[test]
    fn test_alias_must_descend_from_primary() {
        let mut registry = SubclassRegistry::new();
        registry
            .register(&ns(), "dog", Kind::new("zoo.Dog", &["zoo.Animal"]))
            .unwrap();
        let cat = Kind::new("zoo.Cat", &["zoo.Animal"]);
        assert!(matches!(
            registry.register_alias(&ns(), "dog", cat).unwrap_err(),
            KeyError::Conflict { .. }
        ));
        let bird = Kind::new("zoo.Bird", &["zoo.Animal"]);
        assert!(matches!(
            registry.register_alias(&ns(), "bird", bird).unwrap_err(),
            KeyError::Unknown { .. }
        ));
    }

    #[test]
    fn test_subclasses_of_groups_by_name() {
        let mut registry = SubclassRegistry::new();
        let animal = Kind::new("zoo.Animal", &[]);
        let dog = Kind::new("zoo.Dog", &["zoo.Animal"]);
        let cat = Kind::new("zoo.Cat", &["zoo.Animal"]);
        let puppy = Kind::new("zoo.Puppy", &["zoo.Dog", "zoo.Animal"]);
        registry.register(&ns(), "dog", Arc::clone(&dog)).unwrap();
        registry.register(&ns(), "cat", cat).unwrap();
        registry.register(&ns(), "puppy", puppy).unwrap();

        let all = registry.subclasses_of(&ns(), &animal);
        let names: Vec<&str> = all.keys().map(String::as_str).collect();
        assert_eq!(names, ["dog", "cat", "puppy"]);

        let under_dog = registry.subclasses_of(&ns(), &dog);
        assert_eq!(under_dog.len(), 1);
        assert_eq!(under_dog["puppy"][0].type_name(), "zoo.Puppy");

        assert!(registry.has_subclasses(&ns(), &dog));
        assert!(!registry.has_subclasses(&ns(), &under_dog["puppy"][0]));
        assert!(!registry.has_subclasses(&NamespaceKey::new("none"), &animal));
    }
}
