//! # Array Schema
//!
//! A homogeneous ordered sequence. Every item is wrapped through the item
//! schema on the way in, whether at construction or on later mutation.

use serde_json::{json, Value};

use crate::node::SchemaNode;

/// A schema for a homogeneous ordered sequence.
#[derive(Debug, Clone)]
pub struct ArraySchema {
    /// Schema for every item.
    pub items: SchemaNode,
}

impl ArraySchema {
    /// A sequence of `items`.
    pub fn new(items: SchemaNode) -> Self {
        Self { items }
    }

    pub(crate) fn definition(&self) -> Value {
        json!({
            "type": "array",
            "items": self.items.ref_schema(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_definition_inlines_unnamed_items() {
        let node = SchemaNode::array(SchemaNode::int());
        assert_eq!(
            node.definition(),
            json!({"type": "array", "items": {"type": "integer"}})
        );
    }

    #[test]
    fn test_array_accept_wraps_items() {
        let node = SchemaNode::array(SchemaNode::int());
        let element = node.accept_root(json!([1, "2", 3.0])).unwrap();
        assert_eq!(element.to_plain(), json!([1, 2, 3]));
        assert!(node.accept_root(json!({"a": 1})).unwrap_err().is_validation());
        assert!(node.accept_root(json!([1, "x"])).unwrap_err().is_validation());
    }
}
