//! Object and Dict elements: ordered maps whose every value was accepted by
//! the schema governing its key.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use sdom_core::{describe, DomError, ValidationError, ValueError};

use super::element::Element;
use super::position::{DomInfo, NodeInfo, Position, WeakNode};
use crate::node::{DeclaredType, SchemaNode};
use crate::object::{DictSchema, ObjectSchema};

#[derive(Clone)]
pub(crate) enum MapKind {
    Object(Arc<ObjectSchema>),
    Dict(Arc<DictSchema>),
}

impl MapKind {
    fn schema_for_key(&self, key: &str) -> Result<SchemaNode, DomError> {
        match self {
            Self::Object(schema) => Ok(schema.schema_for_key(key)?),
            Self::Dict(schema) => {
                if !schema.key_allowed(key) {
                    return Err(ValueError::KeyPatternMismatch {
                        pattern: schema.key_pattern().unwrap_or_default().to_string(),
                        key: key.to_string(),
                    }
                    .into());
                }
                Ok(schema.items.clone())
            }
        }
    }

    fn is_required(&self, key: &str) -> bool {
        match self {
            Self::Object(schema) => schema.is_required(key),
            Self::Dict(_) => false,
        }
    }
}

pub(crate) struct MapNode {
    pub(crate) info: NodeInfo,
    pub(crate) kind: MapKind,
    pub(crate) entries: IndexMap<String, Element>,
}

type Shared = Rc<RefCell<MapNode>>;

fn build(kind: MapKind, value: Value, position: Position) -> Result<Shared, DomError> {
    let Value::Object(raw) = value else {
        return Err(ValidationError::WrongType {
            expected: "object".to_string(),
            value: describe(&value),
        }
        .into());
    };
    let node = Rc::new(RefCell::new(MapNode {
        info: position.into_info(),
        kind: kind.clone(),
        entries: IndexMap::with_capacity(raw.len()),
    }));
    let mut entries = IndexMap::with_capacity(raw.len());
    for (key, item) in raw {
        let child = wrap(&node, &kind, &key, item)?;
        entries.insert(key, child);
    }
    if let MapKind::Object(schema) = &kind {
        if let Some(missing) = schema.required.iter().find(|k| !entries.contains_key(*k)) {
            return Err(ValidationError::MissingRequired {
                key: missing.clone(),
            }
            .into());
        }
    }
    node.borrow_mut().entries = entries;
    Ok(node)
}

/// Accept `item` as the value under `key` of `node`. No borrow of `node` is
/// held while the child is built.
fn wrap(node: &Shared, kind: &MapKind, key: &str, item: Value) -> Result<Element, DomError> {
    let schema = kind.schema_for_key(key)?;
    let position = node
        .borrow()
        .info
        .child(WeakNode::Map(Rc::downgrade(node)), Some(key.to_string()));
    schema.accept(item, position)
}

fn set(node: &Shared, key: &str, value: Value) -> Result<(), DomError> {
    let kind = node.borrow().kind.clone();
    let child = wrap(node, &kind, key, value)?;
    node.borrow_mut().entries.insert(key.to_string(), child);
    Ok(())
}

fn remove(node: &Shared, key: &str) -> Result<Option<Element>, DomError> {
    if node.borrow().kind.is_required(key) {
        return Err(ValidationError::RequiredKey {
            key: key.to_string(),
        }
        .into());
    }
    Ok(node.borrow_mut().entries.shift_remove(key))
}

fn to_plain(node: &Shared) -> Value {
    let map: Map<String, Value> = node
        .borrow()
        .entries
        .iter()
        .map(|(key, child)| (key.clone(), child.to_plain()))
        .collect();
    Value::Object(map)
}

macro_rules! map_element_api {
    ($ty:ident, $variant:ident) => {
        impl $ty {
            /// The value under `key`, if present.
            pub fn get(&self, key: &str) -> Option<Element> {
                self.0.borrow().entries.get(key).cloned()
            }

            /// Wrap `value` through the schema for `key` and store it,
            /// replacing any previous value. On error nothing changes.
            pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), DomError> {
                set(&self.0, key, value.into())
            }

            /// Remove `key`, returning the detached value.
            ///
            /// # Errors
            ///
            /// `ValidationError::RequiredKey` if `key` is required.
            pub fn remove(&self, key: &str) -> Result<Option<Element>, DomError> {
                remove(&self.0, key)
            }

            /// Whether `key` is present.
            pub fn contains_key(&self, key: &str) -> bool {
                self.0.borrow().entries.contains_key(key)
            }

            /// Keys in insertion order.
            pub fn keys(&self) -> Vec<String> {
                self.0.borrow().entries.keys().cloned().collect()
            }

            /// `(key, value)` pairs in insertion order.
            pub fn entries(&self) -> Vec<(String, Element)> {
                self.0
                    .borrow()
                    .entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            }

            /// Number of entries.
            pub fn len(&self) -> usize {
                self.0.borrow().entries.len()
            }

            /// Whether there are no entries.
            pub fn is_empty(&self) -> bool {
                self.0.borrow().entries.is_empty()
            }

            /// Plain JSON for the whole subtree.
            pub fn to_plain(&self) -> Value {
                to_plain(&self.0)
            }

            /// Position in the tree.
            pub fn dom(&self) -> DomInfo {
                let info = self.0.borrow().info.clone();
                info.describe(&Element::$variant(self.clone()))
            }

            /// Whether both handles refer to the same element.
            pub fn ptr_eq(&self, other: &Self) -> bool {
                Rc::ptr_eq(&self.0, &other.0)
            }
        }
    };
}

// ─── Object ──────────────────────────────────────────────────────────

/// A structured record element. Cloning the handle shares the element.
#[derive(Clone)]
pub struct ObjectElement(pub(crate) Shared);

impl ObjectElement {
    /// Build an element from a raw object.
    ///
    /// # Errors
    ///
    /// `ValidationError` for a non-object or a missing required key,
    /// `KeyError` for a disallowed key, or whatever a child's schema raises.
    pub fn build(
        schema: Arc<ObjectSchema>,
        value: Value,
        position: Position,
    ) -> Result<Self, DomError> {
        build(MapKind::Object(schema), value, position).map(Self)
    }

    /// The schema that built this element.
    pub fn schema(&self) -> Arc<ObjectSchema> {
        match &self.0.borrow().kind {
            MapKind::Object(schema) => Arc::clone(schema),
            // Object handles are only ever made over object nodes.
            MapKind::Dict(_) => Arc::new(ObjectSchema::default()),
        }
    }

    /// The declared type the element was built for, if any.
    pub fn object_type(&self) -> Option<Arc<dyn DeclaredType>> {
        self.schema().object_type.clone()
    }
}

map_element_api!(ObjectElement, Object);

// ─── Dict ────────────────────────────────────────────────────────────

/// A dynamic-key map element. Cloning the handle shares the element.
#[derive(Clone)]
pub struct DictElement(pub(crate) Shared);

impl DictElement {
    /// Build an element from a raw object.
    ///
    /// # Errors
    ///
    /// `ValidationError` for a non-object, `ValueError` for a key that does
    /// not match the key pattern, or whatever the item schema raises.
    pub fn build(
        schema: Arc<DictSchema>,
        value: Value,
        position: Position,
    ) -> Result<Self, DomError> {
        build(MapKind::Dict(schema), value, position).map(Self)
    }

    /// The schema that built this element.
    pub fn schema(&self) -> Arc<DictSchema> {
        match &self.0.borrow().kind {
            MapKind::Dict(schema) => Arc::clone(schema),
            MapKind::Object(_) => Arc::new(DictSchema::new(SchemaNode::Anything)),
        }
    }
}

map_element_api!(DictElement, Dict);

pub(crate) fn new_detached(kind: MapKind, info: NodeInfo) -> Shared {
    Rc::new(RefCell::new(MapNode {
        info,
        kind,
        entries: IndexMap::new(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Additional;
    use serde_json::json;

    fn address() -> Arc<ObjectSchema> {
        Arc::new(
            ObjectSchema::new([
                ("firstLine".to_string(), SchemaNode::string()),
                ("secondLine".to_string(), SchemaNode::string()),
                ("city".to_string(), SchemaNode::string()),
            ])
            .with_required(["firstLine", "city"]),
        )
    }

    fn build_address(value: Value) -> Result<ObjectElement, DomError> {
        ObjectElement::build(address(), value, Position::root())
    }

    #[test]
    fn test_build_keeps_input_order() {
        let element = build_address(json!({"city": "X", "firstLine": "1 Rd"})).unwrap();
        assert_eq!(element.keys(), vec!["city", "firstLine"]);
        assert_eq!(element.to_plain(), json!({"city": "X", "firstLine": "1 Rd"}));
    }

    #[test]
    fn test_build_errors_by_class() {
        let missing = build_address(json!({"firstLine": "1 Rd"})).unwrap_err();
        assert!(matches!(
            missing,
            DomError::Validation(ValidationError::MissingRequired { ref key }) if key == "city"
        ));
        let unknown = build_address(json!({"firstLine": "1 Rd", "city": "X", "zip": 1})).unwrap_err();
        assert!(unknown.is_key());
        assert!(build_address(json!([1])).unwrap_err().is_validation());
    }

    #[test]
    fn test_set_replaces_in_place_and_is_atomic() {
        let element = build_address(json!({"firstLine": "1 Rd", "city": "X"})).unwrap();
        element.set("firstLine", "2 Rd").unwrap();
        assert_eq!(element.keys(), vec!["firstLine", "city"]);
        assert!(element.set("city", json!([1])).unwrap_err().is_validation());
        assert!(element.set("nope", "v").unwrap_err().is_key());
        assert_eq!(element.to_plain(), json!({"firstLine": "2 Rd", "city": "X"}));
    }

    #[test]
    fn test_remove_only_optional_keys() {
        let element =
            build_address(json!({"firstLine": "1 Rd", "secondLine": "Flat 2", "city": "X"})).unwrap();
        let removed = element.remove("secondLine").unwrap().unwrap();
        assert_eq!(removed.to_plain(), json!("Flat 2"));
        assert!(element.remove("secondLine").unwrap().is_none());
        let err = element.remove("city").unwrap_err();
        assert!(matches!(
            err,
            DomError::Validation(ValidationError::RequiredKey { .. })
        ));
        assert!(element.contains_key("city"));
    }

    #[test]
    fn test_additional_schema_applies_to_unknown_keys() {
        let schema = Arc::new(
            ObjectSchema::new([("name".to_string(), SchemaNode::string())])
                .with_additional(Additional::Schema(SchemaNode::int())),
        );
        let element =
            ObjectElement::build(schema, json!({"name": "n", "x": "4"}), Position::root()).unwrap();
        assert_eq!(element.get("x").unwrap().to_plain(), json!(4));
        assert!(element.set("y", "four").unwrap_err().is_validation());
    }

    #[test]
    fn test_dict_key_pattern() {
        let schema = Arc::new(
            DictSchema::new(SchemaNode::int())
                .with_key_pattern("^[a-f0-9]{6}$")
                .unwrap(),
        );
        let element =
            DictElement::build(schema.clone(), json!({"a1b2c3": 1}), Position::root()).unwrap();
        let err = element.set("zz0000", 2).unwrap_err();
        assert!(matches!(
            err,
            DomError::Value(ValueError::KeyPatternMismatch { .. })
        ));
        assert!(
            DictElement::build(schema, json!({"zz0000": 1}), Position::root())
                .unwrap_err()
                .is_value()
        );
        element.remove("a1b2c3").unwrap();
        assert!(element.is_empty());
    }

    #[test]
    fn test_children_point_at_parent_and_document() {
        let outer = Arc::new(
            ObjectSchema::new([("inner".to_string(), SchemaNode::Object(address()))]),
        );
        let root = ObjectElement::build(
            outer,
            json!({"inner": {"firstLine": "1 Rd", "city": "X"}}),
            Position::root(),
        )
        .unwrap();
        let inner = root.get("inner").unwrap();
        let info = inner.dom();
        assert_eq!(info.key.as_deref(), Some("inner"));
        assert!(info.parent.unwrap().same_instance(&Element::Object(root.clone())));
        assert!(info.document.unwrap().same_instance(&Element::Object(root.clone())));
        let root_info = root.dom();
        assert!(root_info.parent.is_none());
        assert!(root_info.document.unwrap().same_instance(&Element::Object(root)));
    }

    #[test]
    fn test_dropped_parent_reads_as_absent() {
        let outer = Arc::new(
            ObjectSchema::new([("inner".to_string(), SchemaNode::Object(address()))]),
        );
        let root = ObjectElement::build(
            outer,
            json!({"inner": {"firstLine": "1 Rd", "city": "X"}}),
            Position::root(),
        )
        .unwrap();
        let inner = root.get("inner").unwrap();
        drop(root);
        let info = inner.dom();
        assert!(info.parent.is_none());
        assert!(info.document.is_none());
        assert_eq!(info.key.as_deref(), Some("inner"));
    }
}
