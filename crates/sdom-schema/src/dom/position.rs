//! Position tracking: where an element sits in its document.
//!
//! Containers record their document root, parent and key in a [`NodeInfo`].
//! Parent and document links are weak; a link whose target has been dropped
//! reads as absent. Leaves carry no position of their own.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::element::Element;
use super::list::{ListElement, ListNode};
use super::map::{DictElement, MapKind, MapNode, ObjectElement};

/// Non-owning link to a container node.
#[derive(Clone)]
pub(crate) enum WeakNode {
    Map(Weak<RefCell<MapNode>>),
    List(Weak<RefCell<ListNode>>),
}

impl WeakNode {
    /// A weak link to `element`, or `None` for leaves.
    pub(crate) fn to(element: &Element) -> Option<Self> {
        match element {
            Element::Leaf(_) => None,
            Element::Object(object) => Some(Self::Map(Rc::downgrade(&object.0))),
            Element::Dict(dict) => Some(Self::Map(Rc::downgrade(&dict.0))),
            Element::List(list) => Some(Self::List(Rc::downgrade(&list.0))),
        }
    }

    pub(crate) fn upgrade(&self) -> Option<Element> {
        match self {
            Self::Map(weak) => {
                let node = weak.upgrade()?;
                let is_object = matches!(node.borrow().kind, MapKind::Object(_));
                Some(if is_object {
                    Element::Object(ObjectElement(node))
                } else {
                    Element::Dict(DictElement(node))
                })
            }
            Self::List(weak) => weak.upgrade().map(|node| Element::List(ListElement(node))),
        }
    }
}

/// Stored position of a container. `document == None` means the node is
/// its own document root.
#[derive(Clone, Default)]
pub(crate) struct NodeInfo {
    pub(crate) document: Option<WeakNode>,
    pub(crate) parent: Option<WeakNode>,
    pub(crate) key: Option<String>,
}

impl NodeInfo {
    /// The position a child of the node described by `self` gets, where
    /// `me` is a link to that node.
    pub(crate) fn child(&self, me: WeakNode, key: Option<String>) -> Position {
        Position {
            document: Some(self.document.clone().unwrap_or_else(|| me.clone())),
            parent: Some(me),
            key,
        }
    }

    pub(crate) fn describe(&self, element: &Element) -> DomInfo {
        DomInfo {
            element: element.clone(),
            document: match &self.document {
                None => Some(element.clone()),
                Some(link) => link.upgrade(),
            },
            parent: self.parent.as_ref().and_then(WeakNode::upgrade),
            key: self.key.clone(),
        }
    }
}

/// Where a newly built element is placed.
#[derive(Clone, Default)]
pub struct Position {
    document: Option<WeakNode>,
    parent: Option<WeakNode>,
    key: Option<String>,
}

impl Position {
    /// Detached: the element becomes the root of its own document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Under `parent` at `key` (`None` for list items), inheriting the
    /// parent's document. A leaf `parent` yields a detached position.
    pub fn child_of(parent: &Element, key: Option<&str>) -> Self {
        let Some(link) = WeakNode::to(parent) else {
            return Self::root();
        };
        let document = parent
            .dom()
            .document
            .as_ref()
            .and_then(WeakNode::to)
            .unwrap_or_else(|| link.clone());
        Self {
            document: Some(document),
            parent: Some(link),
            key: key.map(str::to_string),
        }
    }

    pub(crate) fn into_info(self) -> NodeInfo {
        NodeInfo {
            document: self.document,
            parent: self.parent,
            key: self.key,
        }
    }
}

/// A snapshot of an element's place in its tree.
#[derive(Debug, Clone)]
pub struct DomInfo {
    /// The element itself.
    pub element: Element,
    /// Root of the element's document. An element built detached is its own
    /// root.
    pub document: Option<Element>,
    /// The containing element.
    pub parent: Option<Element>,
    /// Key in the parent; `None` for list items and roots.
    pub key: Option<String>,
}
