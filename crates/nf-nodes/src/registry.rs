//! Process-wide mapping of `node_type` to a factory that builds a fresh
//! `Node` instance, plus its metadata (§4.3).

use std::collections::HashMap;
use std::sync::Arc;

use nf_domain::Error;

use crate::contract::{Node, NodeMetadata};

/// Builds a fresh boxed [`Node`] instance on demand. Nodes are
/// stateless-by-contract, so the registry stores a constructor rather than
/// a shared instance.
pub type NodeFactory = Arc<dyn Fn() -> Box<dyn Node> + Send + Sync>;

struct Entry {
    factory: NodeFactory,
    metadata: NodeMetadata,
}

/// Registry of node types. Registration is idempotent but logs a warning on
/// overwrite; lookups on an unknown type fail with `NodeTypeUnknown` listing
/// every known type.
#[derive(Default)]
pub struct NodeRegistry {
    entries: HashMap<String, Entry>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, node_type: impl Into<String>, factory: NodeFactory, metadata: NodeMetadata) {
        let node_type = node_type.into();
        if self.entries.contains_key(&node_type) {
            tracing::warn!(node_type, "node type already registered, overwriting");
        }
        self.entries.insert(node_type, Entry { factory, metadata });
    }

    pub fn get(&self, node_type: &str) -> Result<Box<dyn Node>, Error> {
        match self.entries.get(node_type) {
            Some(entry) => Ok((entry.factory)()),
            None => Err(Error::NodeTypeUnknown {
                requested: node_type.to_string(),
                known: self.list_all(),
            }),
        }
    }

    pub fn metadata(&self, node_type: &str) -> Option<&NodeMetadata> {
        self.entries.get(node_type).map(|e| &e.metadata)
    }

    pub fn is_registered(&self, node_type: &str) -> bool {
        self.entries.contains_key(node_type)
    }

    /// All registered node types, sorted.
    pub fn list_all(&self) -> Vec<String> {
        let mut types: Vec<String> = self.entries.keys().cloned().collect();
        types.sort();
        types
    }

    /// Node types in the given category.
    pub fn get_by_category(&self, category: &str) -> Vec<String> {
        let mut types: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.metadata.category == category)
            .map(|(t, _)| t.clone())
            .collect();
        types.sort();
        types
    }

    /// Every distinct category among registered node types, sorted.
    pub fn get_categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .entries
            .values()
            .map(|e| e.metadata.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Clears the registry. For tests.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::NodeIo;
    use async_trait::async_trait;
    use crate::schema::ConfigSchema;

    struct Dummy(&'static str, &'static str);

    #[async_trait]
    impl Node for Dummy {
        fn node_type(&self) -> &str {
            self.0
        }
        fn metadata(&self) -> NodeMetadata {
            NodeMetadata {
                node_type: self.0.into(),
                name: self.0.into(),
                description: String::new(),
                category: self.1.into(),
            }
        }
        fn describe_schema(&self) -> ConfigSchema {
            ConfigSchema::default()
        }
        async fn execute(&self, inputs: &NodeIo, _config: &NodeIo) -> Result<NodeIo, Error> {
            Ok(inputs.clone())
        }
    }

    fn registry_with_two() -> NodeRegistry {
        let mut reg = NodeRegistry::new();
        reg.register(
            "text_input",
            Arc::new(|| Box::new(Dummy("text_input", "input")) as Box<dyn Node>),
            NodeMetadata {
                node_type: "text_input".into(),
                name: "Text Input".into(),
                description: String::new(),
                category: "input".into(),
            },
        );
        reg.register(
            "llm_call",
            Arc::new(|| Box::new(Dummy("llm_call", "llm")) as Box<dyn Node>),
            NodeMetadata {
                node_type: "llm_call".into(),
                name: "LLM Call".into(),
                description: String::new(),
                category: "llm".into(),
            },
        );
        reg
    }

    #[test]
    fn get_unknown_type_lists_known_types() {
        let reg = registry_with_two();
        let err = reg.get("nonexistent").unwrap_err();
        match err {
            Error::NodeTypeUnknown { requested, known } => {
                assert_eq!(requested, "nonexistent");
                assert_eq!(known, vec!["llm_call".to_string(), "text_input".to_string()]);
            }
            _ => panic!("expected NodeTypeUnknown"),
        }
    }

    #[test]
    fn get_known_type_builds_instance() {
        let reg = registry_with_two();
        let node = reg.get("text_input").unwrap();
        assert_eq!(node.node_type(), "text_input");
    }

    #[test]
    fn registration_is_idempotent_with_overwrite() {
        let mut reg = NodeRegistry::new();
        reg.register(
            "x",
            Arc::new(|| Box::new(Dummy("x", "a")) as Box<dyn Node>),
            NodeMetadata { node_type: "x".into(), name: "X".into(), description: String::new(), category: "a".into() },
        );
        reg.register(
            "x",
            Arc::new(|| Box::new(Dummy("x", "b")) as Box<dyn Node>),
            NodeMetadata { node_type: "x".into(), name: "X".into(), description: String::new(), category: "b".into() },
        );
        assert_eq!(reg.metadata("x").unwrap().category, "b");
        assert_eq!(reg.list_all().len(), 1);
    }

    #[test]
    fn get_by_category_and_categories() {
        let reg = registry_with_two();
        assert_eq!(reg.get_by_category("llm"), vec!["llm_call".to_string()]);
        assert_eq!(reg.get_categories(), vec!["input".to_string(), "llm".to_string()]);
    }

    #[test]
    fn clear_empties_registry() {
        let mut reg = registry_with_two();
        reg.clear();
        assert!(reg.list_all().is_empty());
        assert!(!reg.is_registered("text_input"));
    }
}
