//! # Schema Nodes
//!
//! A [`SchemaNode`] is a composable rule describing which raw values are
//! valid and how to wrap them into DOM elements. Every variant supports
//! three operations:
//!
//! - [`SchemaNode::definition`]: the JSON-Schema (Draft-07) fragment.
//! - [`SchemaNode::validate`]: whether a raw value conforms.
//! - [`SchemaNode::accept`]: wrap a raw value into an [`Element`] at a
//!   given [`Position`], or fail.
//!
//! ## Sharing
//!
//! Composite payloads sit behind `Arc`, so cloning a node is cheap and an
//! element can keep a handle to the exact schema that built it.
//!
//! ## Provided nodes
//!
//! [`SchemaNode::Provided`] delegates to whatever its [`SchemaProvider`]
//! resolves *at call time*. Declared object types use it so that subtypes
//! registered after a base type was declared still take part in the base
//! type's schema.

use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use sdom_core::{ConstructionError, DomError};

use crate::any_of::AnyOfSchema;
use crate::array::ArraySchema;
use crate::dom::{Element, Position};
use crate::object::{DictSchema, ObjectSchema};
use crate::scalar::{EnumSchema, PatternSchema};

/// The four primitive scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// A JSON string.
    String,
    /// A JSON boolean.
    Bool,
    /// A JSON integer.
    Int,
    /// A JSON number.
    Float,
}

impl PrimitiveKind {
    /// The JSON Schema `type` keyword value for this kind.
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::Float => "number",
        }
    }
}

impl FromStr for PrimitiveKind {
    type Err = ConstructionError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "string" | "str" => Ok(Self::String),
            "bool" | "boolean" => Ok(Self::Bool),
            "int" | "integer" => Ok(Self::Int),
            "float" | "number" => Ok(Self::Float),
            other => Err(ConstructionError::UnknownKind {
                tag: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_type())
    }
}

/// Policy for keys that are not named fields of an object schema.
#[derive(Debug, Clone, Default)]
pub enum Additional {
    /// Unknown keys are rejected.
    #[default]
    Forbidden,
    /// Unknown keys hold any value, stored unchanged.
    Allowed,
    /// Unknown keys hold values accepted by this schema.
    Schema(SchemaNode),
}

impl Additional {
    /// The `additionalProperties` keyword value.
    pub fn definition(&self) -> Value {
        match self {
            Self::Forbidden => Value::Bool(false),
            Self::Allowed => Value::Bool(true),
            Self::Schema(node) => node.ref_schema(),
        }
    }
}

/// A declared object type that an object schema builds elements for.
///
/// Implemented by the object layer; the schema layer only carries the tag
/// so that elements can report which declared type they are.
pub trait DeclaredType: Send + Sync + fmt::Debug {
    /// Fully-qualified name of the type.
    fn type_name(&self) -> &str;

    /// Upcast for recovering the concrete type.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Computes a schema on demand.
pub trait SchemaProvider: Send + Sync + fmt::Debug {
    /// The schema in effect right now. Called on every use; never cached.
    fn resolve(&self) -> SchemaNode;
}

/// A composable rule describing valid raw values and how to wrap them.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    /// A primitive scalar, cast then validated.
    Primitive(PrimitiveKind),
    /// Only `null`.
    Null,
    /// Exactly this literal.
    Const(Value),
    /// Exactly one member of an enumeration.
    Enum(Arc<EnumSchema>),
    /// A string matching a regular expression.
    Pattern(Arc<PatternSchema>),
    /// Any value, unchanged.
    Anything,
    /// A structured record with named fields.
    Object(Arc<ObjectSchema>),
    /// A homogeneous ordered sequence.
    Array(Arc<ArraySchema>),
    /// A map with dynamic keys and one item schema.
    Dict(Arc<DictSchema>),
    /// A union where exactly one member may accept a value.
    AnyOf(Arc<AnyOfSchema>),
    /// A schema resolved afresh on every use.
    Provided(Arc<dyn SchemaProvider>),
}

impl SchemaNode {
    /// A string primitive.
    pub fn string() -> Self {
        Self::Primitive(PrimitiveKind::String)
    }

    /// A boolean primitive.
    pub fn bool() -> Self {
        Self::Primitive(PrimitiveKind::Bool)
    }

    /// An integer primitive.
    pub fn int() -> Self {
        Self::Primitive(PrimitiveKind::Int)
    }

    /// A number primitive.
    pub fn float() -> Self {
        Self::Primitive(PrimitiveKind::Float)
    }

    /// A constant.
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Const(value.into())
    }

    /// A string pattern.
    pub fn pattern(pattern: &str) -> Result<Self, ConstructionError> {
        Ok(Self::Pattern(Arc::new(PatternSchema::new(pattern)?)))
    }

    /// An array of `items`.
    pub fn array(items: SchemaNode) -> Self {
        Self::Array(Arc::new(ArraySchema::new(items)))
    }

    /// A dict of `items` with unrestricted keys.
    pub fn dict(items: SchemaNode) -> Self {
        Self::Dict(Arc::new(DictSchema::new(items)))
    }

    /// A dict of `items` whose keys must match `key_pattern`.
    pub fn dict_with_key_pattern(
        items: SchemaNode,
        key_pattern: &str,
    ) -> Result<Self, ConstructionError> {
        Ok(Self::Dict(Arc::new(
            DictSchema::new(items).with_key_pattern(key_pattern)?,
        )))
    }

    /// An unnamed union.
    pub fn any_of(members: impl IntoIterator<Item = SchemaNode>) -> Self {
        Self::AnyOf(Arc::new(AnyOfSchema::new(members)))
    }

    /// A node delegating to `provider`.
    pub fn provided(provider: impl SchemaProvider + 'static) -> Self {
        Self::Provided(Arc::new(provider))
    }

    /// The node with every [`SchemaNode::Provided`] layer resolved.
    pub fn resolved(&self) -> SchemaNode {
        let mut node = self.clone();
        loop {
            match node {
                Self::Provided(provider) => node = provider.resolve(),
                other => return other,
            }
        }
    }

    /// The name under which this node is shared in `definitions`, if any.
    pub fn ref_name(&self) -> Option<String> {
        match self {
            Self::Object(schema) => schema.ref_name.clone(),
            Self::AnyOf(schema) => schema.ref_name.clone(),
            Self::Provided(provider) => provider.resolve().ref_name(),
            _ => None,
        }
    }

    /// The JSON-Schema definition of this node. Named children appear as
    /// `$ref`s; unnamed children are inlined.
    pub fn definition(&self) -> Value {
        match self {
            Self::Primitive(kind) => json!({ "type": kind.json_type() }),
            Self::Null => json!({ "type": "null" }),
            Self::Const(value) => json!({ "const": value }),
            Self::Enum(schema) => schema.definition(),
            Self::Pattern(schema) => schema.definition(),
            Self::Anything => json!({}),
            Self::Object(schema) => schema.definition(),
            Self::Array(schema) => schema.definition(),
            Self::Dict(schema) => schema.definition(),
            Self::AnyOf(schema) => schema.definition(),
            Self::Provided(provider) => provider.resolve().definition(),
        }
    }

    /// Wrap `value` into a validated element placed at `position`.
    ///
    /// # Errors
    ///
    /// Fails with the error class of the first rule the value breaks. On
    /// failure no element is reachable from anywhere.
    pub fn accept(&self, value: Value, position: Position) -> Result<Element, DomError> {
        match self {
            Self::Primitive(kind) => Ok(Element::Leaf(kind.cast(value)?)),
            Self::Null => crate::scalar::accept_null(value),
            Self::Const(expected) => crate::scalar::accept_const(expected, value),
            Self::Enum(schema) => schema.accept(value),
            Self::Pattern(schema) => schema.accept(value),
            Self::Anything => Ok(Element::Leaf(value)),
            Self::Object(schema) => crate::dom::ObjectElement::build(schema.clone(), value, position)
                .map(Element::Object),
            Self::Array(schema) => crate::dom::ListElement::build(schema.clone(), value, position)
                .map(Element::List),
            Self::Dict(schema) => crate::dom::DictElement::build(schema.clone(), value, position)
                .map(Element::Dict),
            Self::AnyOf(schema) => schema.accept(value, position),
            Self::Provided(provider) => provider.resolve().accept(value, position),
        }
    }

    /// Wrap `value` as the root of a new document.
    pub fn accept_root(&self, value: Value) -> Result<Element, DomError> {
        self.accept(value, Position::root())
    }

    /// Direct child nodes, for traversals over the schema graph.
    pub(crate) fn children(&self) -> Vec<SchemaNode> {
        match self {
            Self::Object(schema) => {
                let mut children: Vec<SchemaNode> = schema.properties.values().cloned().collect();
                if let Additional::Schema(node) = &schema.additional {
                    children.push(node.clone());
                }
                children
            }
            Self::Array(schema) => vec![schema.items.clone()],
            Self::Dict(schema) => vec![schema.items.clone()],
            Self::AnyOf(schema) => schema.members.clone(),
            Self::Provided(provider) => provider.resolve().children(),
            _ => Vec::new(),
        }
    }

    /// Short description of the node's shape, for error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Self::Primitive(kind) => kind.json_type().to_string(),
            Self::Null => "null".to_string(),
            Self::Const(_) => "const".to_string(),
            Self::Enum(_) => "enum".to_string(),
            Self::Pattern(_) => "pattern".to_string(),
            Self::Anything => "anything".to_string(),
            Self::Object(_) => "object".to_string(),
            Self::Array(_) => "array".to_string(),
            Self::Dict(_) => "dict".to_string(),
            Self::AnyOf(_) => "anyOf".to_string(),
            Self::Provided(provider) => provider.resolve().kind_name(),
        }
    }

    /// Whether a pattern may be layered on this node.
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            Self::Primitive(PrimitiveKind::String) | Self::Pattern(_)
        )
    }
}

impl From<PrimitiveKind> for SchemaNode {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }
}

impl From<ObjectSchema> for SchemaNode {
    fn from(schema: ObjectSchema) -> Self {
        Self::Object(Arc::new(schema))
    }
}

impl From<DictSchema> for SchemaNode {
    fn from(schema: DictSchema) -> Self {
        Self::Dict(Arc::new(schema))
    }
}

impl From<ArraySchema> for SchemaNode {
    fn from(schema: ArraySchema) -> Self {
        Self::Array(Arc::new(schema))
    }
}

impl From<AnyOfSchema> for SchemaNode {
    fn from(schema: AnyOfSchema) -> Self {
        Self::AnyOf(Arc::new(schema))
    }
}

impl From<EnumSchema> for SchemaNode {
    fn from(schema: EnumSchema) -> Self {
        Self::Enum(Arc::new(schema))
    }
}

impl From<PatternSchema> for SchemaNode {
    fn from(schema: PatternSchema) -> Self {
        Self::Pattern(Arc::new(schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fixed(SchemaNode);

    impl SchemaProvider for Fixed {
        fn resolve(&self) -> SchemaNode {
            self.0.clone()
        }
    }

    #[test]
    fn test_primitive_kind_tags() {
        assert_eq!("str".parse::<PrimitiveKind>().unwrap(), PrimitiveKind::String);
        assert_eq!("integer".parse::<PrimitiveKind>().unwrap(), PrimitiveKind::Int);
        let err = "decimal".parse::<PrimitiveKind>().unwrap_err();
        assert!(matches!(err, ConstructionError::UnknownKind { .. }));
    }

    #[test]
    fn test_primitive_definitions() {
        assert_eq!(SchemaNode::string().definition(), json!({"type": "string"}));
        assert_eq!(SchemaNode::bool().definition(), json!({"type": "boolean"}));
        assert_eq!(SchemaNode::int().definition(), json!({"type": "integer"}));
        assert_eq!(SchemaNode::float().definition(), json!({"type": "number"}));
        assert_eq!(SchemaNode::Null.definition(), json!({"type": "null"}));
        assert_eq!(SchemaNode::Anything.definition(), json!({}));
        assert_eq!(
            SchemaNode::constant("dog").definition(),
            json!({"const": "dog"})
        );
    }

    #[test]
    fn test_provided_node_delegates() {
        let node = SchemaNode::provided(Fixed(SchemaNode::int()));
        assert_eq!(node.definition(), json!({"type": "integer"}));
        assert!(matches!(node.resolved(), SchemaNode::Primitive(PrimitiveKind::Int)));
        assert_eq!(node.kind_name(), "integer");
        let element = node.accept_root(json!(3)).unwrap();
        assert_eq!(element.to_plain(), json!(3));
    }

    #[test]
    fn test_additional_definitions() {
        assert_eq!(Additional::Forbidden.definition(), json!(false));
        assert_eq!(Additional::Allowed.definition(), json!(true));
        assert_eq!(
            Additional::Schema(SchemaNode::string()).definition(),
            json!({"type": "string"})
        );
    }
}
