//! # Scalar Schemas
//!
//! Leaf rules: primitive casts, `null`, constants, enumerations and string
//! patterns. Each produces an [`Element::Leaf`].
//!
//! ## Primitive cast
//!
//! Primitive nodes apply a single explicit cast before checking the type:
//!
//! | kind     | accepted input                                  |
//! |----------|-------------------------------------------------|
//! | `string` | string, number, boolean (rendered as text)      |
//! | `int`    | integer, integral float, numeric string         |
//! | `float`  | number, numeric string                          |
//! | `bool`   | boolean only                                    |
//!
//! Nothing else is coerced anywhere in the tree.

use regex::Regex;
use serde_json::{json, Value};

use sdom_core::{describe, ConstructionError, DomError, ValidationError, ValueError};

use crate::dom::Element;
use crate::node::PrimitiveKind;

impl PrimitiveKind {
    /// Cast `value` to this kind.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::WrongType` when no cast applies.
    pub fn cast(&self, value: Value) -> Result<Value, ValidationError> {
        let cast = match (self, value) {
            (Self::String, Value::String(s)) => Ok(Value::String(s)),
            (Self::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (Self::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),
            (Self::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
            (Self::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(Value::Number(n)),
            (Self::Int, Value::Number(n)) => match n.as_f64().and_then(integral) {
                Some(i) => Ok(Value::from(i)),
                None => Err(Value::Number(n)),
            },
            (Self::Int, Value::String(s)) => match s.trim().parse::<i64>() {
                Ok(i) => Ok(Value::from(i)),
                Err(_) => Err(Value::String(s)),
            },
            (Self::Float, Value::Number(n)) => Ok(Value::Number(n)),
            (Self::Float, Value::String(s)) => match s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
            {
                Some(n) => Ok(Value::Number(n)),
                None => Err(Value::String(s)),
            },
            (_, other) => Err(other),
        };
        cast.map_err(|rejected| ValidationError::WrongType {
            expected: self.json_type().to_string(),
            value: describe(&rejected),
        })
    }
}

/// The integer a float represents exactly, if any.
fn integral(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

pub(crate) fn accept_null(value: Value) -> Result<Element, DomError> {
    if value.is_null() {
        Ok(Element::Leaf(Value::Null))
    } else {
        Err(ValidationError::WrongType {
            expected: "null".to_string(),
            value: describe(&value),
        }
        .into())
    }
}

pub(crate) fn accept_const(expected: &Value, value: Value) -> Result<Element, DomError> {
    if *expected == value {
        Ok(Element::Leaf(value))
    } else {
        Err(ValueError::ConstMismatch {
            expected: describe(expected),
            value: describe(&value),
        }
        .into())
    }
}

// ─── Enumerations ────────────────────────────────────────────────────

/// A named member of an enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    /// Member name.
    pub name: String,
    /// Raw value the member stands for.
    pub value: Value,
}

/// A schema requiring one of a set of enumerated values.
///
/// Two members may share a value (an alias); such a value is ambiguous and
/// rejected, exactly like a union with two matching members.
#[derive(Debug, Clone)]
pub struct EnumSchema {
    name: String,
    members: Vec<EnumMember>,
}

impl EnumSchema {
    /// An enumeration called `name` with the given `(member, value)` pairs.
    pub fn new<N: Into<String>>(
        name: impl Into<String>,
        members: impl IntoIterator<Item = (N, Value)>,
    ) -> Self {
        Self {
            name: name.into(),
            members: members
                .into_iter()
                .map(|(name, value)| EnumMember {
                    name: name.into(),
                    value,
                })
                .collect(),
        }
    }

    /// The enumeration's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All members in declaration order.
    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    /// Distinct member values in declaration order.
    pub fn allowed_values(&self) -> Vec<Value> {
        let mut values: Vec<Value> = Vec::with_capacity(self.members.len());
        for member in &self.members {
            if !values.contains(&member.value) {
                values.push(member.value.clone());
            }
        }
        values
    }

    /// The single member whose value equals `value`.
    ///
    /// # Errors
    ///
    /// `ValueError::NoEnumMember` if none match, `AmbiguousEnumMember` if
    /// several do.
    pub fn member_for(&self, value: &Value) -> Result<&EnumMember, ValueError> {
        let matched: Vec<&EnumMember> = self.members.iter().filter(|m| m.value == *value).collect();
        match matched.as_slice() {
            [member] => Ok(member),
            [] => Err(ValueError::NoEnumMember {
                enum_name: self.name.clone(),
                value: describe(value),
            }),
            many => Err(ValueError::AmbiguousEnumMember {
                enum_name: self.name.clone(),
                value: describe(value),
                members: many.iter().map(|m| m.name.clone()).collect(),
            }),
        }
    }

    pub(crate) fn accept(&self, value: Value) -> Result<Element, DomError> {
        self.member_for(&value)?;
        Ok(Element::Leaf(value))
    }

    pub(crate) fn definition(&self) -> Value {
        json!({ "enum": self.allowed_values() })
    }
}

// ─── Patterns ────────────────────────────────────────────────────────

/// A schema requiring a string that matches a regular expression.
#[derive(Debug, Clone)]
pub struct PatternSchema {
    regex: Regex,
}

impl PatternSchema {
    /// Compile `pattern`.
    ///
    /// # Errors
    ///
    /// `ConstructionError::InvalidPattern` if the expression does not compile.
    pub fn new(pattern: &str) -> Result<Self, ConstructionError> {
        let regex = Regex::new(pattern).map_err(|e| ConstructionError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { regex })
    }

    /// The literal pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether `text` matches.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub(crate) fn accept(&self, value: Value) -> Result<Element, DomError> {
        let Value::String(text) = &value else {
            return Err(ValidationError::WrongType {
                expected: "string".to_string(),
                value: describe(&value),
            }
            .into());
        };
        if !self.regex.is_match(text) {
            return Err(ValueError::PatternMismatch {
                pattern: self.pattern().to_string(),
                value: describe(&value),
            }
            .into());
        }
        Ok(Element::Leaf(PrimitiveKind::String.cast(value)?))
    }

    pub(crate) fn definition(&self) -> Value {
        json!({ "type": "string", "pattern": self.pattern() })
    }
}
