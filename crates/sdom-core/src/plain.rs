//! # Plain Data
//!
//! Plain data is the canonical, wrapper-free form of a document: nested
//! `serde_json::Value` maps, sequences and scalars. Every DOM tree is built
//! from plain data and unwraps back into it, so the text formats on either
//! side (JSON, YAML) only ever meet this module.
//!
//! YAML has a richer type system than JSON (tags, non-string keys), but
//! documents only use the JSON-compatible subset. [`yaml_to_json_value`]
//! converts a YAML tree into the equivalent JSON tree.

use serde_json::Value;

use crate::error::DomError;

/// Longest rendering of a value embedded in an error message.
const DESCRIBE_LIMIT: usize = 120;

/// Render a value for an error message, truncated to a readable length.
pub fn describe(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= DESCRIBE_LIMIT {
        return rendered;
    }
    let truncated: String = rendered.chars().take(DESCRIBE_LIMIT).collect();
    format!("{truncated}...")
}

/// Decode JSON text into plain data.
pub fn parse_json(text: &str) -> Result<Value, DomError> {
    serde_json::from_str(text).map_err(|e| DomError::Serialization(format!("invalid JSON: {e}")))
}

/// Decode YAML text into plain data.
pub fn parse_yaml(text: &str) -> Result<Value, DomError> {
    let yaml_value: serde_yaml::Value = serde_yaml::from_str(text)
        .map_err(|e| DomError::Serialization(format!("invalid YAML: {e}")))?;
    yaml_to_json_value(&yaml_value)
        .map_err(|e| DomError::Serialization(format!("YAML-to-JSON conversion failed: {e}")))
}

/// Encode plain data as YAML text.
pub fn to_yaml_string(value: &Value) -> Result<String, DomError> {
    serde_yaml::to_string(value).map_err(|e| DomError::Serialization(e.to_string()))
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Tags are dropped and the inner value converted. Scalar map keys are
/// stringified; sequence or mapping keys are rejected.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_yaml_to_json_conversion() {
        let yaml_str = r#"
first_name: Marge
last_name: Simpson
postal_code: 12345
active: true
vehicles:
  - ABC123
  - XYZ789
"#;
        let json_value = parse_yaml(yaml_str).unwrap();
        assert_eq!(json_value["first_name"], "Marge");
        assert_eq!(json_value["postal_code"], 12345);
        assert_eq!(json_value["active"], true);
        assert_eq!(json_value["vehicles"][1], "XYZ789");
    }

    #[test]
    fn test_yaml_numeric_keys_are_stringified() {
        let json_value = parse_yaml("1: one\ntrue: yes\n").unwrap();
        assert_eq!(json_value["1"], "one");
        assert_eq!(json_value["true"], "yes");
    }

    #[test]
    fn test_yaml_sequence_key_rejected() {
        let err = parse_yaml("? [a, b]\n: c\n").unwrap_err();
        assert!(matches!(err, DomError::Serialization(_)));
    }

    #[test]
    fn test_parse_json_error_is_serialization() {
        let err = parse_json("{not json").unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn test_describe_truncates_long_values() {
        let long = json!("x".repeat(500));
        let described = describe(&long);
        assert!(described.ends_with("..."));
        assert!(described.chars().count() <= DESCRIBE_LIMIT + 3);
        assert_eq!(describe(&json!(5)), "5");
    }
}
