//! The element handle: a leaf value or a shared container node, with
//! plain-data conversion, walking and copies.

use std::fmt;

use serde_json::Value;

use sdom_core::DomError;

use super::copy::CopyMemo;
use super::list::ListElement;
use super::map::{DictElement, ObjectElement};
use super::position::DomInfo;
use super::walk::Walk;
use crate::node::SchemaNode;

/// A validated node of a document tree.
///
/// Cloning an `Element` clones the handle: both clones refer to the same
/// container. Use [`Element::shallow_copy`] or [`Element::deep_copy`] for a
/// fresh identity.
#[derive(Clone)]
pub enum Element {
    /// A scalar, `null`, or any raw value accepted unchanged.
    Leaf(Value),
    /// A structured record.
    Object(ObjectElement),
    /// A homogeneous sequence.
    List(ListElement),
    /// A dynamic-key map.
    Dict(DictElement),
}

impl Element {
    /// Plain JSON for the whole subtree. No element wrappers remain.
    pub fn to_plain(&self) -> Value {
        match self {
            Self::Leaf(value) => value.clone(),
            Self::Object(object) => object.to_plain(),
            Self::List(list) => list.to_plain(),
            Self::Dict(dict) => dict.to_plain(),
        }
    }

    /// Position in the tree. Leaves carry no position of their own; use
    /// [`Element::walk`] on a container to see them with parent and key.
    pub fn dom(&self) -> DomInfo {
        match self {
            Self::Leaf(_) => DomInfo {
                element: self.clone(),
                document: None,
                parent: None,
                key: None,
            },
            Self::Object(object) => object.dom(),
            Self::List(list) => list.dom(),
            Self::Dict(dict) => dict.dom(),
        }
    }

    /// The schema that built this container; `None` for leaves.
    pub fn schema(&self) -> Option<SchemaNode> {
        match self {
            Self::Leaf(_) => None,
            Self::Object(object) => Some(SchemaNode::Object(object.schema())),
            Self::List(list) => Some(SchemaNode::Array(list.schema())),
            Self::Dict(dict) => Some(SchemaNode::Dict(dict.schema())),
        }
    }

    /// Depth-first, pre-order traversal of this element and every
    /// descendant, leaves included.
    pub fn walk(&self) -> Walk {
        Walk::new(self.clone())
    }

    /// The raw value of a leaf.
    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            Self::Leaf(value) => Some(value),
            _ => None,
        }
    }

    /// The object element, if this is one.
    pub fn as_object(&self) -> Option<&ObjectElement> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The list element, if this is one.
    pub fn as_list(&self) -> Option<&ListElement> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    /// The dict element, if this is one.
    pub fn as_dict(&self) -> Option<&DictElement> {
        match self {
            Self::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    /// Whether this is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Whether both handles refer to the same container. Leaves have no
    /// identity and never compare the same.
    pub fn same_instance(&self, other: &Element) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::List(a), Self::List(b)) => a.ptr_eq(b),
            (Self::Dict(a), Self::Dict(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// A fresh, detached element rebuilt through this element's own schema
    /// from its plain data.
    ///
    /// # Errors
    ///
    /// Whatever the schema raises; only possible if a leaf was accepted
    /// by a schema that now rejects it.
    pub fn shallow_copy(&self) -> Result<Element, DomError> {
        match self.schema() {
            None => Ok(self.clone()),
            Some(schema) => schema.accept_root(self.to_plain()),
        }
    }

    /// A recursive copy with fresh identity throughout. The copy takes this
    /// element's place in the tree (same parent, document and key, though
    /// the parent does not hold it); descendants link to their copied
    /// parents.
    pub fn deep_copy(&self) -> Element {
        CopyMemo::default().copy(self)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.to_plain() == other.to_plain()
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(value) => f.debug_tuple("Leaf").field(value).finish(),
            Self::Object(object) => fmt::Debug::fmt(object, f),
            Self::List(list) => fmt::Debug::fmt(list, f),
            Self::Dict(dict) => fmt::Debug::fmt(dict, f),
        }
    }
}

impl fmt::Debug for ObjectElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Object").field(&self.to_plain()).finish()
    }
}

impl fmt::Debug for ListElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("List").field(&self.to_plain()).finish()
    }
}

impl fmt::Debug for DictElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dict").field(&self.to_plain()).finish()
    }
}

impl From<Element> for Value {
    fn from(element: Element) -> Self {
        element.to_plain()
    }
}

impl From<&Element> for Value {
    fn from(element: &Element) -> Self {
        element.to_plain()
    }
}

impl From<ObjectElement> for Element {
    fn from(object: ObjectElement) -> Self {
        Self::Object(object)
    }
}

impl From<ListElement> for Element {
    fn from(list: ListElement) -> Self {
        Self::List(list)
    }
}

impl From<DictElement> for Element {
    fn from(dict: DictElement) -> Self {
        Self::Dict(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectSchema;
    use serde_json::json;

    fn doc() -> Element {
        let inner: SchemaNode = ObjectSchema::new([("n".to_string(), SchemaNode::int())]).into();
        let outer: SchemaNode = ObjectSchema::new([
            ("title".to_string(), SchemaNode::string()),
            ("items".to_string(), SchemaNode::array(inner)),
        ])
        .into();
        outer
            .accept_root(json!({"title": "t", "items": [{"n": 1}, {"n": 2}]}))
            .unwrap()
    }

    #[test]
    fn test_equality_is_by_content() {
        let a = doc();
        let b = doc();
        assert_eq!(a, b);
        assert!(!a.same_instance(&b));
        assert!(a.same_instance(&a.clone()));
        assert!(!Element::Leaf(json!(1)).same_instance(&Element::Leaf(json!(1))));
    }

    #[test]
    fn test_shallow_copy_is_detached() {
        let original = doc();
        let items = original.as_object().unwrap().get("items").unwrap();
        let copy = items.shallow_copy().unwrap();
        assert_eq!(copy, items);
        assert!(!copy.same_instance(&items));
        let info = copy.dom();
        assert!(info.parent.is_none());
        assert!(info.document.unwrap().same_instance(&copy));
    }

    #[test]
    fn test_deep_copy_keeps_position_and_relinks_children() {
        let original = doc();
        let items = original.as_object().unwrap().get("items").unwrap();
        let copy = items.deep_copy();
        assert_eq!(copy, items);
        assert!(!copy.same_instance(&items));

        let info = copy.dom();
        assert!(info.parent.unwrap().same_instance(&original));
        assert_eq!(info.key.as_deref(), Some("items"));

        let first = copy.as_list().unwrap().get(0).unwrap();
        let first_info = first.dom();
        assert!(first_info.parent.unwrap().same_instance(&copy));
        assert!(first_info.document.unwrap().same_instance(&original));
        assert!(!first.same_instance(&items.as_list().unwrap().get(0).unwrap()));
    }

    #[test]
    fn test_element_converts_to_plain_value() {
        let original = doc();
        let value: Value = (&original).into();
        assert_eq!(value["items"][1]["n"], 2);
    }
}
