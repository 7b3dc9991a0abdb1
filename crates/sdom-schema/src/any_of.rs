//! # Union Schema
//!
//! [`AnyOfSchema`] accepts a value only when exactly one member validates
//! it. Zero matches and several matches are both errors: a tie is never
//! broken by member order, so overlapping member schemas surface as soon as
//! a value falls into the overlap.

use serde_json::{json, Value};

use sdom_core::{describe, DomError, ValidationError};

use crate::dom::{Element, Position};
use crate::node::SchemaNode;

/// A union schema.
#[derive(Debug, Clone, Default)]
pub struct AnyOfSchema {
    /// Candidate schemas in order.
    pub members: Vec<SchemaNode>,
    /// Name under which the schema is shared in `definitions`.
    pub ref_name: Option<String>,
}

impl AnyOfSchema {
    /// An unnamed union of `members`.
    pub fn new(members: impl IntoIterator<Item = SchemaNode>) -> Self {
        Self {
            members: members.into_iter().collect(),
            ref_name: None,
        }
    }

    /// Share the schema under `name`.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.ref_name = Some(name.into());
        self
    }

    /// The single member that validates `value`.
    ///
    /// # Errors
    ///
    /// `ValidationError::NoMatch` or `ValidationError::Ambiguous`, or
    /// `ValidationError::SchemaBuild` if a member's document is rejected.
    pub fn select(&self, value: &Value) -> Result<&SchemaNode, ValidationError> {
        let mut matched: Vec<&SchemaNode> = Vec::new();
        for member in &self.members {
            if member.conforms(value)? {
                matched.push(member);
            }
        }
        tracing::trace!(
            candidates = self.members.len(),
            matched = matched.len(),
            "resolved union member"
        );
        match matched.as_slice() {
            [member] => Ok(member),
            [] => Err(ValidationError::NoMatch {
                value: describe(value),
            }),
            many => Err(ValidationError::Ambiguous {
                count: many.len(),
                value: describe(value),
            }),
        }
    }

    pub(crate) fn accept(&self, value: Value, position: Position) -> Result<Element, DomError> {
        let member = self.select(&value)?;
        member.accept(value, position)
    }

    pub(crate) fn definition(&self) -> Value {
        let members: Vec<Value> = self.members.iter().map(SchemaNode::ref_schema).collect();
        json!({ "anyOf": members })
    }
}
