//! Detached node trees and the deserializer seam that produces them

use serde_json::{Map, Value};
use thiserror::Error;

use crate::graph::{Mesh, NodeContent, Transform};

#[derive(Error, Debug)]
pub enum DeserializeError {
    #[error("Scene description is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Scene description references missing {kind} '{uuid}'")]
    MissingReference { kind: &'static str, uuid: String },
    #[error("Unsupported scene description: {0}")]
    Unsupported(String),
}

/// An owned node tree that is not yet part of any scene graph
#[derive(Debug, Clone, Default)]
pub struct NodeSubtree {
    pub name: String,
    pub kind: String,
    pub transform: Transform,
    pub content: NodeContent,
    pub user_data: Map<String, Value>,
    pub children: Vec<NodeSubtree>,
}

impl NodeSubtree {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: "Group".to_string(),
            ..Default::default()
        }
    }

    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            kind: "Mesh".to_string(),
            content: NodeContent::Mesh(mesh),
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: NodeSubtree) -> Self {
        self.children.push(child);
        self
    }

    /// Total number of nodes in the tree
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NodeSubtree::node_count).sum::<usize>()
    }
}

/// Turns an embedded scene description into a node tree
///
/// Implemented by the host; the viewer runtime treats the description as
/// opaque and only locates it inside the fetched payload.
pub trait SceneDeserializer: Send + Sync {
    fn build(&self, description: &Value) -> Result<NodeSubtree, DeserializeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_count() {
        let tree = NodeSubtree::group("root")
            .with_child(NodeSubtree::group("a").with_child(NodeSubtree::mesh("b", Mesh::default())))
            .with_child(NodeSubtree::mesh("c", Mesh::default()));
        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.children[1].kind, "Mesh");
    }
}
