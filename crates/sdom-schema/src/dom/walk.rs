//! Pre-order traversal of a tree, leaves included.

use super::element::Element;
use super::position::DomInfo;

/// Lazy depth-first, pre-order traversal over a tree.
///
/// Containers report their stored position. Leaves report the parent and
/// key under which the traversal reached them; list items have no key.
pub struct Walk {
    pending: Vec<(Element, Option<Element>, Option<String>)>,
}

impl Walk {
    pub(crate) fn new(root: Element) -> Self {
        Self {
            pending: vec![(root, None, None)],
        }
    }
}

impl Iterator for Walk {
    type Item = DomInfo;

    fn next(&mut self) -> Option<DomInfo> {
        let (element, parent, key) = self.pending.pop()?;

        let children: Vec<(Option<String>, Element)> = match &element {
            Element::Leaf(_) => Vec::new(),
            Element::Object(object) => object
                .entries()
                .into_iter()
                .map(|(k, v)| (Some(k), v))
                .collect(),
            Element::Dict(dict) => dict
                .entries()
                .into_iter()
                .map(|(k, v)| (Some(k), v))
                .collect(),
            Element::List(list) => list.items().into_iter().map(|v| (None, v)).collect(),
        };
        for (child_key, child) in children.into_iter().rev() {
            self.pending.push((child, Some(element.clone()), child_key));
        }

        let info = match element {
            Element::Leaf(_) => {
                let document = match &parent {
                    Some(p) => p.dom().document,
                    None => Some(element.clone()),
                };
                DomInfo {
                    element,
                    document,
                    parent,
                    key,
                }
            }
            container => container.dom(),
        };
        Some(info)
    }
}
