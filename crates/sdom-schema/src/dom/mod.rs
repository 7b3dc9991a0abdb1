//! # Document Object Model
//!
//! The validated runtime tree. [`SchemaNode::accept`](crate::SchemaNode::accept)
//! produces [`Element`]s; every mutation goes through the owning container,
//! which wraps the new value through the governing schema before anything
//! is replaced. A tree therefore never holds a value its schema rejected.
//!
//! ## Ownership
//!
//! Containers are `Rc<RefCell<..>>` nodes. A parent owns its children;
//! children hold weak links back to their parent and document root. Trees
//! are single-threaded (`!Send`).
//!
//! ## Position
//!
//! Each container knows its document root, parent and key ([`DomInfo`]). A
//! value assigned into a container is rebuilt at its new position, so an
//! element taken from one tree and set into another gets fresh links.

mod copy;
mod element;
mod list;
mod map;
mod position;
mod walk;

pub use element::Element;
pub use list::ListElement;
pub use map::{DictElement, ObjectElement};
pub use position::{DomInfo, Position};
pub use walk::Walk;

use crate::node::SchemaNode;

/// Position of `element` in its tree.
pub fn dom(element: &Element) -> DomInfo {
    element.dom()
}

/// Root of the document containing `element`.
pub fn document(element: &Element) -> Option<Element> {
    element.dom().document
}

/// The container holding `element`.
pub fn parent(element: &Element) -> Option<Element> {
    element.dom().parent
}

/// Key of `element` in its parent.
pub fn key(element: &Element) -> Option<String> {
    element.dom().key
}

/// Schema that built `element`.
pub fn schema(element: &Element) -> Option<SchemaNode> {
    element.schema()
}
