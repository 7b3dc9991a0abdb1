//! # Plain-Data Adapters
//!
//! Text and file entry points at the plain-data boundary. Readers decode to
//! a `serde_json::Value` and hand it to the schema; writers start from
//! `to_plain()`. No validation happens here.
//!
//! YAML goes through `serde_yaml` and the YAML-to-JSON conversion in
//! [`sdom_core::plain`], so tagged values lose their tags and scalar map
//! keys become strings.

use std::path::Path;

use serde_json::Value;

use sdom_core::plain::{parse_json, parse_yaml, to_yaml_string};
use sdom_core::DomError;
use sdom_schema::{DictElement, Element, ListElement, ObjectElement, SchemaNode};

use crate::object_type::ObjectType;
use crate::user_object::UserObject;

/// Builds a DOM from plain data in its various encodings.
pub trait FromPlainData {
    /// What a successful read produces.
    type Output;

    /// Build from an already-decoded value.
    fn from_plain(&self, value: Value) -> Result<Self::Output, DomError>;

    /// Build from JSON text.
    fn from_json(&self, text: &str) -> Result<Self::Output, DomError> {
        self.from_plain(parse_json(text)?)
    }

    /// Build from YAML text.
    fn from_yaml(&self, text: &str) -> Result<Self::Output, DomError> {
        self.from_plain(parse_yaml(text)?)
    }

    /// Build from a JSON file.
    fn from_json_file(&self, path: impl AsRef<Path>) -> Result<Self::Output, DomError> {
        let text = read_document(path.as_ref())?;
        self.from_json(&text)
    }

    /// Build from a YAML file.
    fn from_yaml_file(&self, path: impl AsRef<Path>) -> Result<Self::Output, DomError> {
        let text = read_document(path.as_ref())?;
        self.from_yaml(&text)
    }
}

fn read_document(path: &Path) -> Result<String, DomError> {
    let text = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "read document");
    Ok(text)
}

impl FromPlainData for ObjectType {
    type Output = UserObject;

    fn from_plain(&self, value: Value) -> Result<UserObject, DomError> {
        self.accept(value)
    }
}

impl FromPlainData for SchemaNode {
    type Output = Element;

    fn from_plain(&self, value: Value) -> Result<Element, DomError> {
        self.accept_root(value)
    }
}

/// Serializes a DOM back to plain data and text.
pub trait ToPlainData {
    /// The plain value of the whole subtree.
    fn to_plain(&self) -> Value;

    /// Compact JSON.
    fn to_json(&self) -> Result<String, DomError> {
        serde_json::to_string(&self.to_plain()).map_err(|e| DomError::Serialization(e.to_string()))
    }

    /// Indented JSON.
    fn to_json_pretty(&self) -> Result<String, DomError> {
        serde_json::to_string_pretty(&self.to_plain())
            .map_err(|e| DomError::Serialization(e.to_string()))
    }

    /// YAML.
    fn to_yaml(&self) -> Result<String, DomError> {
        to_yaml_string(&self.to_plain())
    }
}

impl ToPlainData for Element {
    fn to_plain(&self) -> Value {
        Element::to_plain(self)
    }
}

impl ToPlainData for UserObject {
    fn to_plain(&self) -> Value {
        UserObject::to_plain(self)
    }
}

impl ToPlainData for ObjectElement {
    fn to_plain(&self) -> Value {
        ObjectElement::to_plain(self)
    }
}

impl ToPlainData for ListElement {
    fn to_plain(&self) -> Value {
        ListElement::to_plain(self)
    }
}

impl ToPlainData for DictElement {
    fn to_plain(&self) -> Value {
        DictElement::to_plain(self)
    }
}
