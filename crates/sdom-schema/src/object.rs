//! # Object and Dict Schemas
//!
//! [`ObjectSchema`] describes a record with named fields, a set of required
//! keys and an [`Additional`] policy for everything else. [`DictSchema`] is
//! the dynamic-key special case: no named fields, every value checked
//! against one item schema, and optionally every key against a pattern.

use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{json, Map, Value};

use sdom_core::{ConstructionError, KeyError};

use crate::node::{Additional, DeclaredType, SchemaNode};

/// A structured record schema.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    /// Named fields in declaration order.
    pub properties: IndexMap<String, SchemaNode>,
    /// Keys that must be present, in declaration order.
    pub required: Vec<String>,
    /// Policy for keys that are not named fields.
    pub additional: Additional,
    /// Name under which the schema is shared in `definitions`.
    pub ref_name: Option<String>,
    /// The declared type whose elements this schema builds.
    pub object_type: Option<Arc<dyn DeclaredType>>,
}

impl ObjectSchema {
    /// A record with the given fields, nothing required, no extra keys.
    pub fn new(properties: impl IntoIterator<Item = (String, SchemaNode)>) -> Self {
        Self {
            properties: properties.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Mark `keys` as required. Duplicates are ignored.
    pub fn with_required<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        for key in keys {
            let key = key.into();
            if !self.required.contains(&key) {
                self.required.push(key);
            }
        }
        self
    }

    /// Set the additional-keys policy.
    pub fn with_additional(mut self, additional: Additional) -> Self {
        self.additional = additional;
        self
    }

    /// Share the schema under `name`.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.ref_name = Some(name.into());
        self
    }

    /// Tag elements built by this schema with `object_type`.
    pub fn for_type(mut self, object_type: Arc<dyn DeclaredType>) -> Self {
        self.object_type = Some(object_type);
        self
    }

    /// Whether `key` must be present.
    pub fn is_required(&self, key: &str) -> bool {
        self.required.iter().any(|k| k == key)
    }

    /// The schema governing values stored under `key`.
    ///
    /// # Errors
    ///
    /// `KeyError::Disallowed` if `key` is not a named field and additional
    /// keys are forbidden.
    pub fn schema_for_key(&self, key: &str) -> Result<SchemaNode, KeyError> {
        if let Some(node) = self.properties.get(key) {
            return Ok(node.clone());
        }
        match &self.additional {
            Additional::Forbidden => Err(KeyError::Disallowed {
                key: key.to_string(),
            }),
            Additional::Allowed => Ok(SchemaNode::Anything),
            Additional::Schema(node) => Ok(node.clone()),
        }
    }

    pub(crate) fn definition(&self) -> Value {
        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|(key, node)| (key.clone(), node.ref_schema()))
            .collect();
        let mut definition = json!({
            "type": "object",
            "properties": properties,
        });
        if !self.required.is_empty() {
            definition["required"] = json!(self.required);
        }
        definition["additionalProperties"] = self.additional.definition();
        definition
    }
}

/// A dynamic-key map schema: an object with no named fields whose values
/// all share one item schema.
#[derive(Debug, Clone)]
pub struct DictSchema {
    /// Schema for every value.
    pub items: SchemaNode,
    key_pattern: Option<Regex>,
}

impl DictSchema {
    /// A dict whose values follow `items`.
    pub fn new(items: SchemaNode) -> Self {
        Self {
            items,
            key_pattern: None,
        }
    }

    /// Require every key to match `pattern`.
    ///
    /// # Errors
    ///
    /// `ConstructionError::InvalidPattern` if the expression does not compile.
    pub fn with_key_pattern(mut self, pattern: &str) -> Result<Self, ConstructionError> {
        let regex = Regex::new(pattern).map_err(|e| ConstructionError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.key_pattern = Some(regex);
        Ok(self)
    }

    /// The literal key pattern, if any.
    pub fn key_pattern(&self) -> Option<&str> {
        self.key_pattern.as_ref().map(Regex::as_str)
    }

    /// Whether `key` is an acceptable dynamic key.
    pub fn key_allowed(&self, key: &str) -> bool {
        self.key_pattern
            .as_ref()
            .map_or(true, |regex| regex.is_match(key))
    }

    pub(crate) fn definition(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": self.items.ref_schema(),
        })
    }
}
