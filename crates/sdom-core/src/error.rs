//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types used throughout sdom. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! Every fallible operation in the workspace returns [`DomError`], which
//! classifies the failure into one of four categories:
//!
//! - [`ValidationError`]: a raw value does not conform to its schema.
//! - [`ConstructionError`]: a schema or type declaration was malformed.
//! - [`KeyError`]: a name or key could not be resolved or is not allowed.
//! - [`ValueError`]: a value failed a literal check (pattern, const, enum).
//!
//! Messages always name the offending value, pattern, or key. Values are
//! rendered through [`crate::plain::describe`] so very large documents do
//! not flood error output.

use std::fmt;

use thiserror::Error;

/// Top-level error type for sdom.
#[derive(Error, Debug)]
pub enum DomError {
    /// A raw value does not conform to the applicable schema.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A schema or type declaration argument was malformed.
    #[error("construction error: {0}")]
    Construction(#[from] ConstructionError),

    /// A key or registered name could not be resolved or is not permitted.
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// A value failed a literal check.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Text could not be decoded into plain data, or plain data could not
    /// be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error reading or writing a document file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DomError {
    /// Whether this is a [`ValidationError`].
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether this is a [`ConstructionError`].
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::Construction(_))
    }

    /// Whether this is a [`KeyError`].
    pub fn is_key(&self) -> bool {
        matches!(self, Self::Key(_))
    }

    /// Whether this is a [`ValueError`].
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

// ─── Validation ──────────────────────────────────────────────────────

/// A raw value does not conform to the applicable schema.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The value has the wrong JSON type for the schema.
    #[error("expected {expected}, got {value}")]
    WrongType {
        /// The JSON type (or cast target) the schema expects.
        expected: String,
        /// The offending value.
        value: String,
    },

    /// No member of a union accepts the value.
    #[error("no valid schema found for value {value}")]
    NoMatch {
        /// The offending value.
        value: String,
    },

    /// More than one member of a union accepts the value.
    #[error("ambiguous validation, {count} schemas matched value {value}")]
    Ambiguous {
        /// Number of members that accepted the value.
        count: usize,
        /// The offending value.
        value: String,
    },

    /// A required key is absent from an object.
    #[error("missing required key '{key}'")]
    MissingRequired {
        /// The missing key.
        key: String,
    },

    /// Attempted to remove a key that the schema requires.
    #[error("cannot remove required key '{key}'")]
    RequiredKey {
        /// The required key.
        key: String,
    },

    /// The value did not conform to a compiled schema document.
    #[error("value does not conform to schema:\n{violations}")]
    Nonconforming {
        /// Structured list of individual violations.
        violations: Violations,
    },

    /// The compiled schema document was rejected by the validator.
    #[error("schema could not be compiled: {reason}")]
    SchemaBuild {
        /// Reason reported by the validator.
        reason: String,
    },
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations {
    violations: Vec<Violation>,
}

impl Violations {
    /// Wrap a list of violations.
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

// ─── Construction ────────────────────────────────────────────────────

/// A schema or type declaration argument was malformed.
#[derive(Error, Debug)]
pub enum ConstructionError {
    /// Both a static default and a default function were supplied.
    #[error("property '{property}' cannot use both default and default_fn")]
    BothDefaults {
        /// The property being declared.
        property: String,
    },

    /// A property was forced to be required while also given a default.
    #[error("property '{property}' cannot be required when a default is specified")]
    RequiredWithDefault {
        /// The property being declared.
        property: String,
    },

    /// A property type tag does not name a primitive kind.
    #[error("unexpected property type '{tag}': expected one of string, bool, int, float")]
    UnknownKind {
        /// The offending tag.
        tag: String,
    },

    /// A pattern was attached to a property whose type is not a string.
    #[error("property '{property}' has a pattern but its type is {actual}, not string")]
    PatternOnNonString {
        /// The property being declared.
        property: String,
        /// Description of the property's actual type.
        actual: String,
    },

    /// A key pattern was attached to a property that does not hold a dict.
    #[error("property '{property}' has a key pattern but does not hold a dict")]
    KeyPatternOnNonDict {
        /// The property being declared.
        property: String,
    },

    /// A regular expression failed to compile.
    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The literal pattern.
        pattern: String,
        /// Compiler error message.
        reason: String,
    },

    /// A registered name was requested for a type that has no registration
    /// namespace.
    #[error("type '{type_name}' cannot be registered: no ancestor registers subclasses")]
    NotRegistrable {
        /// The declared type.
        type_name: String,
    },

    /// Two properties of one type share a storage key.
    #[error("type '{type_name}' declares key '{key}' more than once")]
    DuplicateKey {
        /// The declared type.
        type_name: String,
        /// The duplicated storage key.
        key: String,
    },
}

// ─── Keys ────────────────────────────────────────────────────────────

/// A key or registered name could not be resolved or is not permitted.
#[derive(Error, Debug)]
pub enum KeyError {
    /// The key is not a named field and additional keys are not allowed.
    #[error("no property named '{key}' exists, and additional properties are not allowed")]
    Disallowed {
        /// The offending key.
        key: String,
    },

    /// The attribute is not bound on the declared type.
    #[error("type '{type_name}' has no attribute '{attribute}'")]
    UnknownAttribute {
        /// The declared type.
        type_name: String,
        /// The requested attribute.
        attribute: String,
    },

    /// No registered subclass matches the name.
    #[error("unknown registered subclass key: {name}")]
    Unknown {
        /// The requested registered name.
        name: String,
    },

    /// Several registered subclasses match and none is an ancestor of all
    /// the others.
    #[error("ambiguous registered subclass key '{name}', candidates: {}", candidates.join(", "))]
    Ambiguous {
        /// The requested registered name.
        name: String,
        /// Type names of every candidate.
        candidates: Vec<String>,
    },

    /// The name is already registered to a different type.
    #[error("cannot register {attempted} as '{name}': already used by {existing}")]
    Conflict {
        /// The registered name.
        name: String,
        /// Type currently registered under the name.
        existing: String,
        /// Type whose registration was rejected.
        attempted: String,
    },

    /// A list index is out of range.
    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The list length.
        len: usize,
    },
}

// ─── Values ──────────────────────────────────────────────────────────

/// A value failed a literal check.
#[derive(Error, Debug)]
pub enum ValueError {
    /// A string value does not match a pattern.
    #[error("value {value} does not match regex pattern {pattern}")]
    PatternMismatch {
        /// The literal pattern.
        pattern: String,
        /// The offending value.
        value: String,
    },

    /// A dynamic key does not match the key pattern.
    #[error("key '{key}' does not match key pattern {pattern}")]
    KeyPatternMismatch {
        /// The literal pattern.
        pattern: String,
        /// The offending key.
        key: String,
    },

    /// A value differs from the required constant.
    #[error("value {value} does not equal constant {expected}")]
    ConstMismatch {
        /// The constant.
        expected: String,
        /// The offending value.
        value: String,
    },

    /// No enum member has the value.
    #[error("cannot find a member in {enum_name} with value {value}")]
    NoEnumMember {
        /// The enum's name.
        enum_name: String,
        /// The offending value.
        value: String,
    },

    /// Several enum members share the value.
    #[error("multiple ambiguous members in {enum_name} with value {value}: {}", members.join(", "))]
    AmbiguousEnumMember {
        /// The enum's name.
        enum_name: String,
        /// The offending value.
        value: String,
        /// Names of every matching member.
        members: Vec<String>,
    },
}
