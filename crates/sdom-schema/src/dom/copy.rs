//! Bookkeeping for deep copies: each source node is copied once.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use super::element::Element;
use super::list::ListElement;
use super::map::{new_detached, DictElement, MapKind, MapNode, ObjectElement};
use super::position::{NodeInfo, WeakNode};

/// Origin-to-copy map for one deep copy. A container reachable twice is
/// copied once.
#[derive(Default)]
pub(crate) struct CopyMemo {
    copies: HashMap<usize, Element>,
}

impl CopyMemo {
    /// Copy `element`, giving the copy the original's position.
    pub(crate) fn copy(&mut self, element: &Element) -> Element {
        match element {
            Element::Leaf(value) => Element::Leaf(value.clone()),
            Element::Object(object) => {
                let info = object.0.borrow().info.clone();
                self.copy_map(&object.0, info)
            }
            Element::Dict(dict) => {
                let info = dict.0.borrow().info.clone();
                self.copy_map(&dict.0, info)
            }
            Element::List(list) => {
                let info = list.0.borrow().info.clone();
                self.copy_list(list, info)
            }
        }
    }

    fn copy_at(&mut self, element: &Element, info: NodeInfo) -> Element {
        match element {
            Element::Leaf(value) => Element::Leaf(value.clone()),
            Element::Object(object) => self.copy_map(&object.0, info),
            Element::Dict(dict) => self.copy_map(&dict.0, info),
            Element::List(list) => self.copy_list(list, info),
        }
    }

    fn copy_map(&mut self, origin: &Rc<RefCell<MapNode>>, info: NodeInfo) -> Element {
        let id = Rc::as_ptr(origin) as usize;
        if let Some(copy) = self.copies.get(&id) {
            return copy.clone();
        }

        let (kind, entries) = {
            let node = origin.borrow();
            (node.kind.clone(), node.entries.clone())
        };
        let node = new_detached(kind.clone(), info);
        let copy = match kind {
            MapKind::Object(_) => Element::Object(ObjectElement(Rc::clone(&node))),
            MapKind::Dict(_) => Element::Dict(DictElement(Rc::clone(&node))),
        };
        self.copies.insert(id, copy.clone());

        let me = WeakNode::Map(Rc::downgrade(&node));
        let mut copied = IndexMap::with_capacity(entries.len());
        for (key, child) in entries {
            let child_info = node
                .borrow()
                .info
                .child(me.clone(), Some(key.clone()))
                .into_info();
            copied.insert(key, self.copy_at(&child, child_info));
        }
        node.borrow_mut().entries = copied;
        copy
    }

    fn copy_list(&mut self, origin: &ListElement, info: NodeInfo) -> Element {
        let id = Rc::as_ptr(&origin.0) as usize;
        if let Some(copy) = self.copies.get(&id) {
            return copy.clone();
        }

        let list = ListElement::detached(origin.schema(), info);
        let copy = Element::List(list.clone());
        self.copies.insert(id, copy.clone());

        let me = WeakNode::List(Rc::downgrade(&list.0));
        let mut copied = Vec::with_capacity(origin.len());
        for child in origin.items() {
            let child_info = list.0.borrow().info.child(me.clone(), None).into_info();
            copied.push(self.copy_at(&child, child_info));
        }
        list.0.borrow_mut().items = copied;
        copy
    }
}
