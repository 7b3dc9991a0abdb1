//! Property tests: lookup over a linear lineage.
//!
//! Registering every type of a chain `T0 <- T1 <- ... <- Tn` under one name
//! (the first as primary, the rest as aliases) must always resolve to the
//! shallowest proper subtype of the lookup root.

use std::sync::Arc;

use proptest::prelude::*;
use sdom_registry::{NamespaceKey, RegisteredType, SubclassRegistry};

#[derive(Debug)]
struct Level {
    name: String,
    depth: usize,
}

impl RegisteredType for Level {
    fn type_name(&self) -> &str {
        &self.name
    }

    // In a single chain, deeper means descendant.
    fn is_subtype_of(&self, other: &Self) -> bool {
        self.depth >= other.depth
    }
}

fn chain(len: usize) -> Vec<Arc<Level>> {
    (0..len)
        .map(|depth| {
            Arc::new(Level {
                name: format!("chain.T{depth}"),
                depth,
            })
        })
        .collect()
}

proptest! {
    #[test]
    fn test_lookup_returns_shallowest_proper_subtype(len in 2usize..8, root in 0usize..8) {
        let levels = chain(len);
        let root = root % len;
        let ns = NamespaceKey::new("chain.T0");
        let mut registry = SubclassRegistry::new();
        registry.register(&ns, "t", Arc::clone(&levels[1])).unwrap();
        for level in &levels[2..] {
            registry.register_alias(&ns, "t", Arc::clone(level)).unwrap();
        }

        let result = registry.lookup(&ns, "t", &levels[root]);
        if root + 1 < len {
            let found = result.unwrap();
            prop_assert!(Arc::ptr_eq(&found, &levels[(root + 1).max(1)]));
        } else {
            prop_assert!(result.is_err());
        }
    }
}
