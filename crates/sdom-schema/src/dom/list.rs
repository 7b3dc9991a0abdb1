//! List elements: indexed sequences whose every item was accepted by the
//! array's item schema.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;

use sdom_core::{describe, DomError, KeyError, ValidationError};

use super::element::Element;
use super::position::{DomInfo, NodeInfo, Position, WeakNode};
use crate::array::ArraySchema;

pub(crate) struct ListNode {
    pub(crate) info: NodeInfo,
    pub(crate) schema: Arc<ArraySchema>,
    pub(crate) items: Vec<Element>,
}

/// A homogeneous sequence element. Cloning the handle shares the element.
#[derive(Clone)]
pub struct ListElement(pub(crate) Rc<RefCell<ListNode>>);

impl ListElement {
    /// Build an element from a raw array.
    ///
    /// # Errors
    ///
    /// `ValidationError` for a non-array, or whatever the item schema
    /// raises for any item.
    pub fn build(
        schema: Arc<ArraySchema>,
        value: Value,
        position: Position,
    ) -> Result<Self, DomError> {
        let Value::Array(raw) = value else {
            return Err(ValidationError::WrongType {
                expected: "array".to_string(),
                value: describe(&value),
            }
            .into());
        };
        let list = Self(Rc::new(RefCell::new(ListNode {
            info: position.into_info(),
            schema,
            items: Vec::new(),
        })));
        let items = list.wrap_all(raw)?;
        list.0.borrow_mut().items = items;
        Ok(list)
    }

    pub(crate) fn detached(schema: Arc<ArraySchema>, info: NodeInfo) -> Self {
        Self(Rc::new(RefCell::new(ListNode {
            info,
            schema,
            items: Vec::new(),
        })))
    }

    fn wrap(&self, item: Value) -> Result<Element, DomError> {
        let (schema, position) = {
            let node = self.0.borrow();
            let me = WeakNode::List(Rc::downgrade(&self.0));
            (node.schema.items.clone(), node.info.child(me, None))
        };
        schema.accept(item, position)
    }

    fn wrap_all(&self, items: impl IntoIterator<Item = Value>) -> Result<Vec<Element>, DomError> {
        items.into_iter().map(|item| self.wrap(item)).collect()
    }

    fn check_index(&self, index: usize, len: usize) -> Result<(), KeyError> {
        if index < len {
            Ok(())
        } else {
            Err(KeyError::IndexOutOfRange { index, len })
        }
    }

    /// The schema that built this element.
    pub fn schema(&self) -> Arc<ArraySchema> {
        Arc::clone(&self.0.borrow().schema)
    }

    /// The item at `index`, if any.
    pub fn get(&self, index: usize) -> Option<Element> {
        self.0.borrow().items.get(index).cloned()
    }

    /// All items in order.
    pub fn items(&self) -> Vec<Element> {
        self.0.borrow().items.clone()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.0.borrow().items.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().items.is_empty()
    }

    /// Replace the item at `index`.
    ///
    /// # Errors
    ///
    /// `KeyError::IndexOutOfRange`, or whatever the item schema raises.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<(), DomError> {
        self.check_index(index, self.len())?;
        let item = self.wrap(value.into())?;
        self.0.borrow_mut().items[index] = item;
        Ok(())
    }

    /// Insert before `index`; `index == len()` appends.
    pub fn insert(&self, index: usize, value: impl Into<Value>) -> Result<(), DomError> {
        let len = self.len();
        if index > len {
            return Err(KeyError::IndexOutOfRange { index, len }.into());
        }
        let item = self.wrap(value.into())?;
        self.0.borrow_mut().items.insert(index, item);
        Ok(())
    }

    /// Append an item.
    pub fn push(&self, value: impl Into<Value>) -> Result<(), DomError> {
        let item = self.wrap(value.into())?;
        self.0.borrow_mut().items.push(item);
        Ok(())
    }

    /// Remove and return the item at `index`.
    pub fn remove(&self, index: usize) -> Result<Element, DomError> {
        self.check_index(index, self.len())?;
        Ok(self.0.borrow_mut().items.remove(index))
    }

    /// Remove and return the last item.
    pub fn pop(&self) -> Option<Element> {
        self.0.borrow_mut().items.pop()
    }

    /// Replace `range` with `values`. Every new item is wrapped before
    /// anything is replaced, so on error the list is unchanged.
    ///
    /// # Errors
    ///
    /// `KeyError::IndexOutOfRange` for a range outside the list, or
    /// whatever the item schema raises.
    pub fn splice(
        &self,
        range: Range<usize>,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<Vec<Element>, DomError> {
        let len = self.len();
        if range.start > range.end || range.end > len {
            return Err(KeyError::IndexOutOfRange {
                index: range.end.max(range.start),
                len,
            }
            .into());
        }
        let items = self.wrap_all(values)?;
        let removed = self.0.borrow_mut().items.splice(range, items).collect();
        Ok(removed)
    }

    /// Replace every item with `values`.
    pub fn replace_all(&self, values: impl IntoIterator<Item = Value>) -> Result<(), DomError> {
        let items = self.wrap_all(values)?;
        self.0.borrow_mut().items = items;
        Ok(())
    }

    /// Plain JSON for the whole subtree.
    pub fn to_plain(&self) -> Value {
        Value::Array(self.0.borrow().items.iter().map(Element::to_plain).collect())
    }

    /// Position in the tree.
    pub fn dom(&self) -> DomInfo {
        let info = self.0.borrow().info.clone();
        info.describe(&Element::List(self.clone()))
    }

    /// Whether both handles refer to the same element.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SchemaNode;
    use serde_json::json;

    fn ints(value: Value) -> ListElement {
        ListElement::build(
            Arc::new(ArraySchema::new(SchemaNode::int())),
            value,
            Position::root(),
        )
        .unwrap()
    }

    #[test]
    fn test_mutations_rewrap_items() {
        let list = ints(json!([1, 2]));
        list.push("3").unwrap();
        list.insert(0, 0.0).unwrap();
        list.set(1, json!(10)).unwrap();
        assert_eq!(list.to_plain(), json!([0, 10, 2, 3]));
        assert_eq!(list.remove(0).unwrap().to_plain(), json!(0));
        assert_eq!(list.pop().unwrap().to_plain(), json!(3));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_index_errors() {
        let list = ints(json!([1]));
        let err = list.set(3, 1).unwrap_err();
        assert!(matches!(
            err,
            DomError::Key(KeyError::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert!(list.insert(2, 1).unwrap_err().is_key());
        assert!(list.remove(1).unwrap_err().is_key());
        assert!(list.splice(0..2, vec![]).unwrap_err().is_key());
    }

    #[test]
    fn test_splice_is_atomic() {
        let list = ints(json!([1, 2, 3, 4]));
        let err = list
            .splice(1..3, vec![json!(7), json!("bad")])
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(list.to_plain(), json!([1, 2, 3, 4]));

        let removed = list.splice(1..3, vec![json!(7), json!(8), json!(9)]).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(list.to_plain(), json!([1, 7, 8, 9, 4]));

        list.replace_all(vec![json!(5)]).unwrap();
        assert_eq!(list.to_plain(), json!([5]));
        assert!(list.replace_all(vec![json!(null)]).is_err());
        assert_eq!(list.to_plain(), json!([5]));
    }

    #[test]
    fn test_items_link_to_list_without_key() {
        let schema = Arc::new(ArraySchema::new(SchemaNode::array(SchemaNode::int())));
        let list = ListElement::build(schema, json!([[1], [2]]), Position::root()).unwrap();
        let inner = list.get(1).unwrap();
        let info = inner.dom();
        assert!(info.key.is_none());
        assert!(info.parent.unwrap().same_instance(&Element::List(list.clone())));
        assert!(info.document.unwrap().same_instance(&Element::List(list)));
    }
}
