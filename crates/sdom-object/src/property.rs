//! # Attribute Bindings
//!
//! An [`AttributeBinding`] ties one declared field of an object type to a
//! storage key, a schema and a default policy. Bindings are built once, by
//! [`PropertyBuilder::build`], and never change afterwards.
//!
//! ## Reads
//!
//! A stored value is returned as is. An absent value falls back to the
//! default function, else the static default; a `null` default means the
//! value stays absent. With `persist_defaults` the default is written into
//! the owner through the normal set path, so repeated reads return the same
//! element. Otherwise the default is wrapped afresh on every read, placed
//! under the owner but not stored in it.
//!
//! ## Writes
//!
//! Always through the owner element's set path, so the full schema check
//! applies.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use sdom_core::{ConstructionError, DomError};
use sdom_schema::{Element, Position, PrimitiveKind, SchemaNode};

use crate::object_type::ObjectType;
use crate::user_object::UserObject;

/// Computes a default from the owning object.
pub type DefaultFn = Arc<dyn Fn(&UserObject) -> Result<Value, DomError> + Send + Sync>;

/// What a property holds, before it is resolved to a schema.
#[derive(Debug, Clone)]
pub enum PropertyType {
    /// A primitive kind.
    Primitive(PrimitiveKind),
    /// A primitive kind named by tag, e.g. `"str"` or `"int"`.
    Tag(String),
    /// Instances of a declared object type (or its registered subtypes).
    Object(ObjectType),
    /// Any explicit schema.
    Schema(SchemaNode),
}

impl PropertyType {
    /// The schema this property type stands for.
    ///
    /// # Errors
    ///
    /// `ConstructionError::UnknownKind` for an unrecognised tag.
    pub fn resolve(&self) -> Result<SchemaNode, ConstructionError> {
        match self {
            Self::Primitive(kind) => Ok(SchemaNode::Primitive(*kind)),
            Self::Tag(tag) => Ok(SchemaNode::Primitive(tag.parse()?)),
            Self::Object(object_type) => Ok(object_type.schema()),
            Self::Schema(node) => Ok(node.clone()),
        }
    }
}

impl From<PrimitiveKind> for PropertyType {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }
}

impl From<&str> for PropertyType {
    fn from(tag: &str) -> Self {
        Self::Tag(tag.to_string())
    }
}

impl From<ObjectType> for PropertyType {
    fn from(object_type: ObjectType) -> Self {
        Self::Object(object_type)
    }
}

impl From<&ObjectType> for PropertyType {
    fn from(object_type: &ObjectType) -> Self {
        Self::Object(object_type.clone())
    }
}

impl From<SchemaNode> for PropertyType {
    fn from(node: SchemaNode) -> Self {
        Self::Schema(node)
    }
}

#[derive(Clone)]
enum DefaultPolicy {
    None,
    Static(Value),
    Computed(DefaultFn),
}

#[derive(Debug, Clone)]
enum Container {
    Single,
    List,
    Dict,
}

/// Declares one property of an object type.
#[derive(Clone)]
pub struct PropertyBuilder {
    name: String,
    property_type: PropertyType,
    container: Container,
    optional: Option<bool>,
    default: Option<Value>,
    default_fn: Option<DefaultFn>,
    persist_defaults: bool,
    stored_as: Option<String>,
    pattern: Option<String>,
    key_pattern: Option<String>,
}

impl PropertyBuilder {
    /// A property called `name` holding `property_type`.
    pub fn new(name: impl Into<String>, property_type: impl Into<PropertyType>) -> Self {
        Self {
            name: name.into(),
            property_type: property_type.into(),
            container: Container::Single,
            optional: None,
            default: None,
            default_fn: None,
            persist_defaults: false,
            stored_as: None,
            pattern: None,
            key_pattern: None,
        }
    }

    /// A property holding a list of `items`.
    pub fn list(name: impl Into<String>, items: impl Into<PropertyType>) -> Self {
        Self {
            container: Container::List,
            ..Self::new(name, items)
        }
    }

    /// A property holding a dict of `items`.
    pub fn dict(name: impl Into<String>, items: impl Into<PropertyType>) -> Self {
        Self {
            container: Container::Dict,
            ..Self::new(name, items)
        }
    }

    /// Require dict keys to match `pattern`. Only valid on
    /// [`PropertyBuilder::dict`] properties.
    pub fn key_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.key_pattern = Some(pattern.into());
        self
    }

    /// Whether the property may be absent. Defaults to `false`, or `true`
    /// when a default is given.
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    /// A static default.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// A default computed from the owning object.
    pub fn default_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&UserObject) -> Result<Value, DomError> + Send + Sync + 'static,
    {
        self.default_fn = Some(Arc::new(f));
        self
    }

    /// Store computed defaults in the owner on first read.
    pub fn persist_defaults(mut self) -> Self {
        self.persist_defaults = true;
        self
    }

    /// Store the value under `key` instead of the property name.
    pub fn stored_as(mut self, key: impl Into<String>) -> Self {
        self.stored_as = Some(key.into());
        self
    }

    /// Require string values (or list/dict string items) to match
    /// `pattern`.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Validate the declaration and produce the binding.
    ///
    /// # Errors
    ///
    /// `ConstructionError` when both defaults are given, when a default is
    /// combined with `optional(false)`, for an unknown kind tag, for a
    /// pattern on a non-string property, for a key pattern outside a dict,
    /// or for an invalid regex.
    pub fn build(self) -> Result<AttributeBinding, ConstructionError> {
        let has_default = self.default.is_some() || self.default_fn.is_some();
        if self.default.is_some() && self.default_fn.is_some() {
            return Err(ConstructionError::BothDefaults {
                property: self.name,
            });
        }
        if has_default && self.optional == Some(false) {
            return Err(ConstructionError::RequiredWithDefault {
                property: self.name,
            });
        }

        if self.key_pattern.is_some() && !matches!(self.container, Container::Dict) {
            return Err(ConstructionError::KeyPatternOnNonDict {
                property: self.name,
            });
        }

        let mut schema = self.property_type.resolve()?;
        if let Some(pattern) = &self.pattern {
            if !schema.is_string() {
                return Err(ConstructionError::PatternOnNonString {
                    property: self.name,
                    actual: schema.kind_name(),
                });
            }
            schema = SchemaNode::pattern(pattern)?;
        }
        let schema = match &self.container {
            Container::Single => schema,
            Container::List => SchemaNode::array(schema),
            Container::Dict => match self.key_pattern {
                Some(pattern) => SchemaNode::dict_with_key_pattern(schema, &pattern)?,
                None => SchemaNode::dict(schema),
            },
        };

        let default = match (self.default, self.default_fn) {
            (Some(value), _) => DefaultPolicy::Static(value),
            (None, Some(f)) => DefaultPolicy::Computed(f),
            (None, None) => DefaultPolicy::None,
        };
        Ok(AttributeBinding {
            owner: String::new(),
            key: self.stored_as.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            schema,
            required: !has_default && !self.optional.unwrap_or(false),
            default,
            persist_defaults: self.persist_defaults,
        })
    }
}

/// A declared field of an object type.
#[derive(Clone)]
pub struct AttributeBinding {
    owner: String,
    name: String,
    key: String,
    schema: SchemaNode,
    required: bool,
    default: DefaultPolicy,
    persist_defaults: bool,
}

impl AttributeBinding {
    pub(crate) fn owned_by(mut self, owner: &str) -> Self {
        self.owner = owner.to_string();
        self
    }

    /// Qualified name of the declaring type.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key in the underlying object.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Schema of stored values.
    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    /// Whether the key must be present.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether computed defaults are stored on first read.
    pub fn persists_defaults(&self) -> bool {
        self.persist_defaults
    }

    /// Whether a default is declared.
    pub fn has_default(&self) -> bool {
        !matches!(self.default, DefaultPolicy::None)
    }

    /// The value of this attribute on `owner`, falling back to the default.
    /// `None` when absent and no non-null default applies.
    ///
    /// # Errors
    ///
    /// Whatever the default function or the schema raises for the default.
    pub fn read(&self, owner: &UserObject) -> Result<Option<Element>, DomError> {
        let element = owner.element();
        if let Some(stored) = element.get(&self.key) {
            return Ok(Some(stored));
        }
        let default = match &self.default {
            DefaultPolicy::None => return Ok(None),
            DefaultPolicy::Static(value) => value.clone(),
            DefaultPolicy::Computed(f) => f(owner)?,
        };
        if default.is_null() {
            return Ok(None);
        }
        if self.persist_defaults {
            element.set(&self.key, default)?;
            tracing::debug!(
                owner = %self.owner,
                key = %self.key,
                "persisted default"
            );
            return Ok(element.get(&self.key));
        }
        let position = Position::child_of(&owner.as_element(), Some(&self.key));
        self.schema.accept(default, position).map(Some)
    }

    /// Store `value` on `owner`.
    ///
    /// # Errors
    ///
    /// Whatever the owner's schema raises for the value.
    pub fn write(&self, owner: &UserObject, value: Value) -> Result<(), DomError> {
        owner.element().set(&self.key, value)
    }
}

impl fmt::Debug for AttributeBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeBinding")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("key", &self.key)
            .field("schema", &self.schema.kind_name())
            .field("required", &self.required)
            .field("has_default", &self.has_default())
            .field("persist_defaults", &self.persist_defaults)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_both_defaults_rejected() {
        let err = PropertyBuilder::new("prefix", PrimitiveKind::String)
            .default("x")
            .default_fn(|_| Ok(json!("y")))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConstructionError::BothDefaults { .. }));
    }

    #[test]
    fn test_required_with_default_rejected() {
        let err = PropertyBuilder::new("last_name", "str")
            .default("")
            .optional(false)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConstructionError::RequiredWithDefault { .. }));
    }

    #[test]
    fn test_default_implies_optional() {
        let binding = PropertyBuilder::new("skip", PrimitiveKind::Bool)
            .default(false)
            .build()
            .unwrap();
        assert!(!binding.is_required());
        assert!(binding.has_default());

        let plain = PropertyBuilder::new("name", "str").build().unwrap();
        assert!(plain.is_required());
        let optional = PropertyBuilder::new("name", "str").optional(true).build().unwrap();
        assert!(!optional.is_required());
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let err = PropertyBuilder::new("x", "decimal").build().unwrap_err();
        assert!(matches!(err, ConstructionError::UnknownKind { .. }));
    }

    #[test]
    fn test_pattern_requires_string() {
        let err = PropertyBuilder::new("zip_code", PrimitiveKind::Int)
            .pattern("^[0-9]{5}$")
            .build()
            .unwrap_err();
        match err {
            ConstructionError::PatternOnNonString { property, actual } => {
                assert_eq!(property, "zip_code");
                assert_eq!(actual, "integer");
            }
            other => panic!("Expected PatternOnNonString, got: {other}"),
        }

        let ok = PropertyBuilder::new("zip_code", "str")
            .pattern("^[0-9]{5}$")
            .build()
            .unwrap();
        assert!(matches!(ok.schema(), SchemaNode::Pattern(_)));

        let bad_regex = PropertyBuilder::new("zip_code", "str").pattern("([").build();
        assert!(matches!(
            bad_regex.unwrap_err(),
            ConstructionError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_container_helpers() {
        let tags = PropertyBuilder::list("tags", "str").pattern("^#").build().unwrap();
        assert!(matches!(tags.schema(), SchemaNode::Array(_)));

        let plates = PropertyBuilder::dict("vehicles", "str")
            .key_pattern("^[a-f0-9]{6}$")
            .build()
            .unwrap();
        match plates.schema() {
            SchemaNode::Dict(dict) => assert_eq!(dict.key_pattern(), Some("^[a-f0-9]{6}$")),
            other => panic!("Expected Dict, got: {}", other.kind_name()),
        }
    }

    #[test]
    fn test_key_pattern_outside_dict_is_rejected() {
        for builder in [
            PropertyBuilder::new("plate", "str"),
            PropertyBuilder::list("plates", "str"),
        ] {
            match builder.key_pattern("^[a-f0-9]{6}$").build().unwrap_err() {
                ConstructionError::KeyPatternOnNonDict { property } => {
                    assert!(property.starts_with("plate"));
                }
                other => panic!("Expected KeyPatternOnNonDict, got: {other}"),
            }
        }
    }

    #[test]
    fn test_stored_as_renames_key() {
        let binding = PropertyBuilder::new("first_name", "str")
            .stored_as("firstName")
            .build()
            .unwrap();
        assert_eq!(binding.name(), "first_name");
        assert_eq!(binding.key(), "firstName");
    }
}
