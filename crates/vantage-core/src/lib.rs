//! Vantage Core - Scene graph and model payload types
//!
//! This crate provides the foundational types for the Vantage viewer:
//! - Scene graph with stable node ids, transforms, labels, and status data
//! - Axis-aligned bounds in model and world space
//! - Scene-description discovery inside wrapped remote payloads
//! - Detached subtrees and the deserializer seam that builds them
//! - Installation-progress decoration of loaded models

pub mod bounds;
pub mod decorate;
pub mod envelope;
pub mod graph;
pub mod subtree;

pub use bounds::Aabb;
pub use decorate::{decorate_subtree, InstallStatus, PropertyValue};
pub use envelope::{find_scene_description, is_scene_description};
pub use graph::{
    Geometry, GraphError, Light, Material, Mesh, Node, NodeContent, NodeId, OverlayLabel,
    SceneGraph, Shape, Transform,
};
pub use subtree::{DeserializeError, NodeSubtree, SceneDeserializer};

pub use glam;
