//! JSON-schema-shaped configuration descriptions, as returned by
//! [`crate::contract::Node::describe_schema`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One JSON Schema primitive type, or a union of them (`["string", "null"]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Union(Vec<String>),
}

impl SchemaType {
    pub fn allows(&self, type_name: &str) -> bool {
        match self {
            SchemaType::Single(t) => t == type_name,
            SchemaType::Union(ts) => ts.iter().any(|t| t == type_name),
        }
    }
}

/// Schema for a single configuration property.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PropertySchema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub r#enum: Option<Vec<Value>>,
}

/// A node's configuration schema: `properties` plus the `required` list.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    pub properties: HashMap<String, PropertySchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validates `value` against `expected`, with the JSON-Schema convention
/// that a value typed `integer` also satisfies `number`.
pub fn value_matches_type(value: &Value, expected: &SchemaType) -> bool {
    let actual = json_type_name(value);
    if expected.allows(actual) {
        return true;
    }
    actual == "integer" && expected.allows("number")
}
