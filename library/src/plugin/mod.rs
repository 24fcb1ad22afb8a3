//! Node type registry.

pub mod node_definitions;
pub mod node_types;

use log::warn;
use std::collections::HashMap;

use crate::animation::AnimationKind;
use crate::error::RuntimeError;
use crate::model::node::GraphNode;
use crate::model::value::DataType;
pub use node_types::{NodeCategory, NodeTypeDefinition, PortDefinition};

/// Holds every known node type definition, keyed by `type_id`.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    node_types: HashMap<String, NodeTypeDefinition>,
}

impl NodeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with all built-in node types.
    pub fn with_builtin_nodes() -> Self {
        let mut registry = Self::new();
        node_definitions::register_all_node_types(&mut registry);
        registry
    }

    pub fn register_node_type(&mut self, def: NodeTypeDefinition) {
        if self.node_types.contains_key(&def.type_id) {
            warn!("Node type '{}' registered twice; replacing", def.type_id);
        }
        self.node_types.insert(def.type_id.clone(), def);
    }

    pub fn get_node_type(&self, type_id: &str) -> Option<&NodeTypeDefinition> {
        self.node_types.get(type_id)
    }

    /// Registered definitions sorted by `type_id`.
    pub fn node_types(&self) -> Vec<&NodeTypeDefinition> {
        let mut defs: Vec<&NodeTypeDefinition> = self.node_types.values().collect();
        defs.sort_by(|a, b| a.type_id.cmp(&b.type_id));
        defs
    }

    pub fn node_types_in(&self, category: NodeCategory) -> Vec<&NodeTypeDefinition> {
        self.node_types()
            .into_iter()
            .filter(|d| d.category == category)
            .collect()
    }

    pub fn create_node(&self, type_id: &str) -> Result<GraphNode, RuntimeError> {
        self.create_typed_node(type_id, None)
    }

    pub fn create_typed_node(
        &self,
        type_id: &str,
        user_type: Option<DataType>,
    ) -> Result<GraphNode, RuntimeError> {
        self.get_node_type(type_id)
            .map(|def| def.instantiate(user_type))
            .ok_or_else(|| RuntimeError::UnknownNodeKind(type_id.to_string()))
    }

    pub fn breaks_cycles(&self, type_id: &str) -> bool {
        self.get_node_type(type_id).is_some_and(|d| d.breaks_cycles)
    }

    pub fn is_non_deterministic(&self, type_id: &str) -> bool {
        self.get_node_type(type_id).is_some_and(|d| d.non_deterministic)
    }

    pub fn is_time_dependent(&self, type_id: &str) -> bool {
        self.get_node_type(type_id).is_some_and(|d| d.time_dependent)
    }

    pub fn type_change_reset(&self, type_id: &str) -> Option<AnimationKind> {
        self.get_node_type(type_id).and_then(|d| d.type_change_reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_creates_nodes() {
        let registry = NodeRegistry::with_builtin_nodes();
        let node = registry.create_node("animation.classic").unwrap();
        assert_eq!(node.inputs.len(), 3);
        assert_eq!(node.outputs.len(), 1);
        assert!(registry.breaks_cycles("time.delay_one"));
        assert!(!registry.breaks_cycles("math.add"));
        assert!(registry.is_time_dependent("time.stopwatch"));
        assert!(!registry.is_time_dependent("math.add"));
        assert!(!registry.is_non_deterministic("animation.spring"));
    }

    #[test]
    fn test_type_change_reset_classes() {
        let registry = NodeRegistry::with_builtin_nodes();
        assert_eq!(registry.type_change_reset("animation.classic"), Some(AnimationKind::Classic));
        assert_eq!(registry.type_change_reset("animation.spring"), Some(AnimationKind::Spring));
        assert_eq!(registry.type_change_reset("animation.pop"), Some(AnimationKind::Spring));
        assert_eq!(registry.type_change_reset("animation.smooth"), None);
        assert_eq!(registry.type_change_reset("time.stopwatch"), None);
        assert_eq!(registry.type_change_reset("effect.blur"), None);
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let registry = NodeRegistry::with_builtin_nodes();
        assert!(matches!(
            registry.create_node("effect.blur"),
            Err(RuntimeError::UnknownNodeKind(kind)) if kind == "effect.blur"
        ));
    }

    #[test]
    fn test_category_listing() {
        let registry = NodeRegistry::with_builtin_nodes();
        let animation: Vec<&str> = registry
            .node_types_in(NodeCategory::Animation)
            .iter()
            .map(|d| d.type_id.as_str())
            .collect();
        assert_eq!(
            animation,
            vec!["animation.classic", "animation.pop", "animation.smooth", "animation.spring"]
        );
    }
}
