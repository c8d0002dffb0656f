//! The node execution contract: every node type implements [`Node`] and is
//! registered under a `node_type` string in the [`crate::registry::NodeRegistry`].

use std::sync::Arc;

use async_trait::async_trait;
use nf_domain::Error;
use serde_json::Value;
use uuid::Uuid;

use crate::schema::{ConfigSchema, value_matches_type};
use crate::stream_sink::{NullSink, StreamSink};

/// Inputs and config a node executes with, and the outputs it returns.
pub type NodeIo = serde_json::Map<String, Value>;

/// Metadata describing a registered node type, independent of any one
/// instance's config.
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub node_type: String,
    pub name: String,
    pub description: String,
    pub category: String,
}

/// Every node is polymorphic over this capability set. Implementors provide
/// `describe_schema` and `execute`; the remaining methods have contract-
/// mandated default behaviour and are rarely overridden.
#[async_trait]
pub trait Node: Send + Sync {
    /// Stable identifier this node type is registered under.
    fn node_type(&self) -> &str;

    fn metadata(&self) -> NodeMetadata;

    /// JSON-schema describing the configuration structure.
    fn describe_schema(&self) -> ConfigSchema;

    /// Runs the node's logic. Callers normally go through [`Node::execute_safe`]
    /// instead, which validates config first and wraps unexpected failures.
    async fn execute(&self, inputs: &NodeIo, config: &NodeIo) -> Result<NodeIo, Error>;

    /// Estimated USD cost of executing with these inputs/config. Default: 0.
    fn estimate_cost(&self, _inputs: &NodeIo, _config: &NodeIo) -> f64 {
        0.0
    }

    /// Validates and normalises `config` in place against [`Node::describe_schema`]:
    ///
    /// 1. Every property with a `default` gets it applied if the key is
    ///    absent or null.
    /// 2. Every `required` property must be present and non-null after
    ///    defaults are applied.
    /// 3. Every present key is checked against declared `type`,
    ///    `minimum`/`maximum`, `minLength`/`maxLength`, `enum`.
    /// 4. Any violation fails with `ConfigurationInvalid`, carrying every
    ///    reason, not just the first.
    fn validate_config(&self, config: &mut NodeIo) -> Result<(), Error> {
        let schema = self.describe_schema();
        let mut errors = Vec::new();

        for (name, prop) in &schema.properties {
            if let Some(default) = &prop.default {
                let missing_or_null = match config.get(name) {
                    None => true,
                    Some(Value::Null) => true,
                    Some(_) => false,
                };
                if missing_or_null {
                    config.insert(name.clone(), default.clone());
                }
            }
        }

        let mut missing = Vec::new();
        for field in &schema.required {
            match config.get(field) {
                None | Some(Value::Null) => missing.push(field.clone()),
                Some(_) => {}
            }
        }
        for field in &missing {
            errors.push(format!("missing required field '{field}'"));
        }

        for (name, prop) in &schema.properties {
            let Some(value) = config.get(name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }

            if let Some(expected) = &prop.r#type {
                if !value_matches_type(value, expected) {
                    errors.push(format!(
                        "field '{name}' must be of type {expected:?}, got {value}"
                    ));
                }
            }

            if let Some(min) = prop.minimum {
                if let Some(n) = value.as_f64() {
                    if n < min {
                        errors.push(format!("field '{name}' must be >= {min}, got {n}"));
                    }
                }
            }
            if let Some(max) = prop.maximum {
                if let Some(n) = value.as_f64() {
                    if n > max {
                        errors.push(format!("field '{name}' must be <= {max}, got {n}"));
                    }
                }
            }
            if let Some(min_len) = prop.min_length {
                if let Some(s) = value.as_str() {
                    if s.len() < min_len {
                        errors.push(format!(
                            "field '{name}' must be at least {min_len} characters"
                        ));
                    }
                }
            }
            if let Some(max_len) = prop.max_length {
                if let Some(s) = value.as_str() {
                    if s.len() > max_len {
                        errors.push(format!(
                            "field '{name}' must be at most {max_len} characters"
                        ));
                    }
                }
            }
            if let Some(enum_values) = &prop.r#enum {
                if !enum_values.contains(value) {
                    errors.push(format!(
                        "field '{name}' must be one of {enum_values:?}, got {value}"
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::ConfigurationInvalid(errors))
        }
    }

    /// Validates first (rethrowing validation failures unchanged), then
    /// calls `execute`, wrapping any other error in `NodeExecutionFailure`.
    async fn execute_safe(&self, inputs: &NodeIo, config: &NodeIo) -> Result<NodeIo, Error> {
        let mut config = config.clone();
        self.validate_config(&mut config)?;

        tracing::debug!(node_type = self.node_type(), "executing node");
        match self.execute(inputs, &config).await {
            Ok(outputs) => {
                tracing::debug!(node_type = self.node_type(), "node executed successfully");
                Ok(outputs)
            }
            Err(err @ Error::ConfigurationInvalid(_)) => Err(err),
            Err(err) => {
                tracing::error!(node_type = self.node_type(), error = %err, "node execution failed");
                Err(Error::NodeExecutionFailure {
                    node_type: self.node_type().to_string(),
                    cause: err.to_string(),
                })
            }
        }
    }
}

/// Best-effort, non-blocking stream emission. A no-op unless `execution_id`
/// is bound (§4.2).
pub struct StreamEmitter {
    execution_id: Option<Uuid>,
    sink: Arc<dyn StreamSink>,
}

impl StreamEmitter {
    pub fn unbound() -> Self {
        Self {
            execution_id: None,
            sink: Arc::new(NullSink),
        }
    }

    pub fn bound(execution_id: Uuid, sink: Arc<dyn StreamSink>) -> Self {
        Self {
            execution_id: Some(execution_id),
            sink,
        }
    }

    pub fn emit(&self, event: impl FnOnce(Uuid) -> nf_domain::StreamEvent) {
        if let Some(execution_id) = self.execution_id {
            self.sink.publish(event(execution_id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PropertySchema, SchemaType};
    use std::collections::HashMap;

    struct EchoNode;

    #[async_trait]
    impl Node for EchoNode {
        fn node_type(&self) -> &str {
            "echo"
        }

        fn metadata(&self) -> NodeMetadata {
            NodeMetadata {
                node_type: "echo".into(),
                name: "Echo".into(),
                description: "returns its input".into(),
                category: "test".into(),
            }
        }

        fn describe_schema(&self) -> ConfigSchema {
            let mut properties = HashMap::new();
            properties.insert(
                "greeting".to_string(),
                PropertySchema {
                    r#type: Some(SchemaType::Single("string".into())),
                    default: Some(Value::String("hello".into())),
                    min_length: Some(1),
                    ..Default::default()
                },
            );
            properties.insert(
                "volume".to_string(),
                PropertySchema {
                    r#type: Some(SchemaType::Single("integer".into())),
                    minimum: Some(0.0),
                    maximum: Some(11.0),
                    ..Default::default()
                },
            );
            ConfigSchema {
                properties,
                required: vec!["volume".to_string()],
            }
        }

        async fn execute(&self, inputs: &NodeIo, config: &NodeIo) -> Result<NodeIo, Error> {
            let mut out = inputs.clone();
            out.insert("greeting".to_string(), config["greeting"].clone());
            Ok(out)
        }
    }

    #[test]
    fn validate_config_applies_default() {
        let node = EchoNode;
        let mut config: NodeIo = serde_json::from_value(serde_json::json!({"volume": 5})).unwrap();
        node.validate_config(&mut config).unwrap();
        assert_eq!(config["greeting"], "hello");
    }

    #[test]
    fn validate_config_reports_missing_required() {
        let node = EchoNode;
        let mut config: NodeIo = serde_json::from_value(serde_json::json!({})).unwrap();
        let err = node.validate_config(&mut config).unwrap_err();
        match err {
            Error::ConfigurationInvalid(reasons) => {
                assert!(reasons.iter().any(|r| r.contains("volume")));
            }
            _ => panic!("expected ConfigurationInvalid"),
        }
    }

    #[test]
    fn validate_config_reports_all_violations_not_just_first() {
        let node = EchoNode;
        let mut config: NodeIo =
            serde_json::from_value(serde_json::json!({"volume": 99, "greeting": ""})).unwrap();
        let err = node.validate_config(&mut config).unwrap_err();
        match err {
            Error::ConfigurationInvalid(reasons) => {
                assert!(reasons.len() >= 2, "expected multiple reasons, got {reasons:?}");
            }
            _ => panic!("expected ConfigurationInvalid"),
        }
    }

    #[tokio::test]
    async fn execute_safe_rethrows_validation_error_unchanged() {
        let node = EchoNode;
        let inputs: NodeIo = serde_json::Map::new();
        let config: NodeIo = serde_json::from_value(serde_json::json!({})).unwrap();
        let err = node.execute_safe(&inputs, &config).await.unwrap_err();
        assert!(matches!(err, Error::ConfigurationInvalid(_)));
    }

    #[tokio::test]
    async fn execute_safe_runs_with_defaults_applied() {
        let node = EchoNode;
        let inputs: NodeIo = serde_json::Map::new();
        let config: NodeIo = serde_json::from_value(serde_json::json!({"volume": 5})).unwrap();
        let out = node.execute_safe(&inputs, &config).await.unwrap();
        assert_eq!(out["greeting"], "hello");
    }

    #[test]
    fn stream_emitter_is_noop_when_unbound() {
        let emitter = StreamEmitter::unbound();
        emitter.emit(|id| nf_domain::StreamEvent::log("n1", id, "info", "should not publish"));
    }
}
