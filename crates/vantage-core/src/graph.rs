//! Scene graph - a rooted tree of nodes with transforms, content, labels,
//! and free-form status data
//!
//! The graph owns every node in an id-keyed map. Parents own their children
//! through ordered id lists, so document order is the pre-order walk from
//! the root. Node ids come from a per-graph counter and are never reused.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::bounds::Aabb;
use crate::subtree::NodeSubtree;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),
}

/// Stable node identifier, unique within one scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local transform relative to the parent node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Decompose an affine matrix (column-major, as stored by most
    /// serialized scene formats)
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Rotate about the node's own X axis
    pub fn rotate_local_x(&mut self, angle: f32) {
        self.rotation = (self.rotation * Quat::from_rotation_x(angle)).normalize();
    }
}

/// Surface appearance of a mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: Option<String>,
    /// Linear RGB base colour
    pub color: [f32; 3],
    /// Emissive colour, also used as the selection highlight
    pub emissive: [f32; 3],
    pub opacity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            color: [1.0, 1.0, 1.0],
            emissive: [0.0, 0.0, 0.0],
            opacity: 1.0,
        }
    }
}

/// Drawable form of a geometry, in model space
///
/// Vertex data sits behind `Arc` so scene snapshots can share it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Shape {
    /// Nothing a backend can draw
    #[default]
    None,
    /// Triangle list, indexed when `indices` is present
    Triangles {
        positions: Arc<[[f32; 3]]>,
        indices: Option<Arc<[u32]>>,
    },
    /// Box centred on the origin
    Cuboid { size: Vec3 },
    Sphere { radius: f32 },
    /// Cone frustum along Y, centred on the origin
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
    },
    /// Rectangle in the XY plane facing +Z
    Plane { width: f32, height: f32 },
}

/// Renderable geometry: its drawable shape plus the model-space bounds
/// used for camera fits and picking
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    pub bounds: Aabb,
    pub vertex_count: usize,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: Material,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Directional {
        color: [f32; 3],
        intensity: f32,
        cast_shadow: bool,
        shadow_map_size: u32,
        shadow_near: f32,
        shadow_far: f32,
    },
    Ambient {
        color: [f32; 3],
        intensity: f32,
    },
}

/// What a node contributes to the rendered image
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeContent {
    #[default]
    Group,
    Mesh(Mesh),
    Light(Light),
}

/// Screen-space text marker anchored to a node
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLabel {
    pub text: String,
    /// Anchor offset in the node's local space
    pub offset: Vec3,
    /// Toggled every frame by the declutter pass
    pub visible: bool,
    /// Whether the anchor projected inside the clip volume last frame
    pub in_view: bool,
}

impl OverlayLabel {
    pub fn new(text: impl Into<String>, offset: Vec3) -> Self {
        Self {
            text: text.into(),
            offset,
            visible: true,
            in_view: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// Source-format type tag (e.g. "Mesh", "Group"), kept for display
    pub kind: String,
    pub transform: Transform,
    pub content: NodeContent,
    pub label: Option<OverlayLabel>,
    /// Arbitrary key/value status data
    pub user_data: Map<String, Value>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.content {
            NodeContent::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.content {
            NodeContent::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.content, NodeContent::Mesh(_))
    }

    /// Name for hierarchy display, falling back to the type tag
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.kind
        } else {
            &self.name
        }
    }
}

/// The scene: background plus a rooted node tree
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
    /// sRGB clear colour
    pub background: [f32; 3],
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create a graph holding only the root node (id 0)
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                id: root,
                name: "Scene".to_string(),
                kind: "Scene".to_string(),
                transform: Transform::IDENTITY,
                content: NodeContent::Group,
                label: None,
                user_data: Map::new(),
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
            background: [0.0, 0.0, 0.0],
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a new node as the last child of `parent`
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: impl Into<String>,
        transform: Transform,
        content: NodeContent,
    ) -> Result<NodeId, GraphError> {
        if !self.nodes.contains_key(&parent) {
            return Err(GraphError::UnknownNode(parent));
        }
        let id = self.allocate_id();
        self.nodes.insert(
            id,
            Node {
                id,
                name: name.into(),
                kind: kind.into(),
                transform,
                content,
                label: None,
                user_data: Map::new(),
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }
        Ok(id)
    }

    /// Insert a detached subtree under `parent`, returning the id given to
    /// the subtree's root. Ids are assigned in pre-order.
    pub fn graft(&mut self, parent: NodeId, subtree: NodeSubtree) -> Result<NodeId, GraphError> {
        let NodeSubtree {
            name,
            kind,
            transform,
            content,
            user_data,
            children,
        } = subtree;
        let id = self.add_child(parent, name, kind, transform, content)?;
        if let Some(node) = self.nodes.get_mut(&id) {
            node.user_data = user_data;
        }
        for child in children {
            self.graft(id, child)?;
        }
        Ok(id)
    }

    /// Drop every node except the root
    pub fn clear(&mut self) {
        let root = self.root;
        self.nodes.retain(|id, _| *id == root);
        if let Some(root_node) = self.nodes.get_mut(&root) {
            root_node.children.clear();
        }
    }

    /// Pre-order walk starting at (and including) `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            order.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// Pre-order walk of the whole scene
    pub fn traverse(&self) -> Vec<NodeId> {
        self.descendants(self.root)
    }

    /// Local-to-world matrix of a node
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(&id)?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            matrix = node.transform.matrix() * matrix;
        }
        Some(matrix)
    }

    /// World-space bounds of every mesh at or below `id`; empty when the
    /// subtree holds no geometry
    pub fn world_bounds(&self, id: NodeId) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for node_id in self.descendants(id) {
            let Some(mesh) = self.nodes.get(&node_id).and_then(Node::mesh) else {
                continue;
            };
            if let Some(matrix) = self.world_matrix(node_id) {
                bounds = bounds.union(&mesh.geometry.bounds.transformed(&matrix));
            }
        }
        bounds
    }

    /// World-space anchor point of a node's overlay label
    pub fn label_anchor(&self, id: NodeId) -> Option<Vec3> {
        let node = self.nodes.get(&id)?;
        let label = node.label.as_ref()?;
        Some(self.world_matrix(id)?.transform_point3(label.offset))
    }

    /// Nodes carrying an overlay label, in document order
    pub fn labelled_nodes(&self) -> Vec<NodeId> {
        self.traverse()
            .into_iter()
            .filter(|id| self.nodes.get(id).is_some_and(|n| n.label.is_some()))
            .collect()
    }
}
