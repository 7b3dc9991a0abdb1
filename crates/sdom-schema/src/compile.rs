//! # Schema Compiler
//!
//! Turns a [`SchemaNode`] graph into a standalone Draft-07 document and
//! validates raw values against it.
//!
//! ## Document shape
//!
//! ```json
//! {
//!   "$schema": "http://json-schema.org/draft-07/schema#",
//!   "definitions": { "<name>": { ... }, ... },
//!   "$ref": "#/definitions/<name>"
//! }
//! ```
//!
//! Every named node reachable from the root is emitted exactly once under
//! `definitions` and referenced everywhere else by `$ref`. Unnamed nodes are
//! inlined. An unnamed root contributes its own keywords in place of `$ref`.
//!
//! ## Validation
//!
//! Validation is delegated to the `jsonschema` crate (Draft 7). Compiled
//! validators are cached by the text of the schema document, so polymorphic
//! schemas that change as subtypes are declared simply compile to a new
//! entry.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use jsonschema::Validator;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use sdom_core::{DomError, ValidationError, Violation, Violations};

use crate::node::SchemaNode;

/// The `$schema` URI of every compiled document.
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Escape a definition name for use inside a JSON pointer.
pub fn pointer_escape(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}

/// Percent-encode a JSON pointer for use as a URI fragment.
///
/// Unreserved characters, sub-delims, `:`, `@`, `/` and `?` pass through;
/// everything else is encoded byte by byte as UTF-8.
fn fragment_encode(pointer: &str) -> String {
    let mut encoded = String::with_capacity(pointer.len());
    for c in pointer.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' | '!' | '$' | '&'
            | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '=' | ':' | '@' | '/' | '?' => {
                encoded.push(c);
            }
            _ => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    encoded.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }
    encoded
}

/// The `$ref` target for a definition name.
pub fn definition_ref(name: &str) -> String {
    format!("#{}", fragment_encode(&format!("/definitions/{}", pointer_escape(name))))
}

impl SchemaNode {
    /// A `$ref` object for named nodes, otherwise the inline definition.
    pub fn ref_schema(&self) -> Value {
        match self.ref_name() {
            Some(name) => json!({ "$ref": definition_ref(&name) }),
            None => self.definition(),
        }
    }

    /// Every named node reachable from this one, itself included, keyed by
    /// name in discovery order.
    ///
    /// A name already collected is not revisited, so shared and recursive
    /// references terminate.
    pub fn referenced(&self) -> IndexMap<String, SchemaNode> {
        let mut found: IndexMap<String, SchemaNode> = IndexMap::new();
        let mut pending: Vec<SchemaNode> = vec![self.resolved()];
        while let Some(node) = pending.pop() {
            if let Some(name) = node.ref_name() {
                if found.contains_key(&name) {
                    continue;
                }
                found.insert(name, node.clone());
            }
            // Reverse so that the first child is discovered first.
            let children = node.children();
            pending.extend(children.iter().rev().map(SchemaNode::resolved));
        }
        found
    }

    /// The standalone Draft-07 document for this node.
    pub fn full_schema(&self) -> Value {
        let definitions: Map<String, Value> = self
            .referenced()
            .iter()
            .map(|(name, node)| (name.clone(), node.definition()))
            .collect();
        let mut document = Map::new();
        document.insert("$schema".to_string(), Value::String(DRAFT_07.to_string()));
        document.insert("definitions".to_string(), Value::Object(definitions));
        if let Value::Object(root) = self.ref_schema() {
            document.extend(root);
        }
        Value::Object(document)
    }

    /// Whether `value` conforms to this node, as judged by a Draft-07
    /// validator over [`SchemaNode::full_schema`].
    ///
    /// No casts are applied: `"12"` does not validate as an integer even
    /// though [`SchemaNode::accept`] would cast it. A document the validator
    /// rejects conforms to nothing; use [`SchemaNode::conforms`] to see why.
    pub fn validate(&self, value: &Value) -> bool {
        self.conforms(value).unwrap_or(false)
    }

    /// Like [`SchemaNode::validate`] but surfaces a rejected document.
    ///
    /// # Errors
    ///
    /// `ValidationError::SchemaBuild` if the validator cannot be built.
    pub fn conforms(&self, value: &Value) -> Result<bool, ValidationError> {
        Ok(compiled(&self.full_schema())?.is_valid(value))
    }

    /// Like [`SchemaNode::validate`] but reports every violation.
    ///
    /// # Errors
    ///
    /// `ValidationError::Nonconforming` listing each violation, or
    /// `ValidationError::SchemaBuild` if the document itself is rejected.
    pub fn check(&self, value: &Value) -> Result<(), DomError> {
        let validator = compiled(&self.full_schema())?;
        let violations: Vec<Violation> = validator
            .iter_errors(value)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Nonconforming {
                violations: Violations::new(violations),
            }
            .into())
        }
    }
}

// ─── Validator cache ─────────────────────────────────────────────────

type ValidatorCache = Mutex<HashMap<String, Arc<Validator>>>;

fn cache() -> &'static ValidatorCache {
    static CACHE: OnceLock<ValidatorCache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// The compiled validator for `document`, built on first use.
fn compiled(document: &Value) -> Result<Arc<Validator>, ValidationError> {
    let key = document.to_string();
    if let Some(validator) = cache().lock().get(&key) {
        return Ok(Arc::clone(validator));
    }

    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft7);
    let validator = opts.build(document).map_err(|e| {
        tracing::warn!(error = %e, "compiled schema rejected by validator");
        ValidationError::SchemaBuild {
            reason: e.to_string(),
        }
    })?;
    tracing::debug!(bytes = key.len(), "compiled schema validator");

    let validator = Arc::new(validator);
    cache().lock().insert(key, Arc::clone(&validator));
    Ok(validator)
}
