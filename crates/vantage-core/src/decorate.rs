//! Installation-progress decoration for loaded models
//!
//! Every mesh in a freshly loaded subtree gets a deterministic status
//! derived from its node id, stored in the node's status data and shown on
//! an overlay label.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::graph::{NodeId, OverlayLabel, SceneGraph};

/// Key under which the status is stored in a node's status data
pub const PROPERTY_VALUE_KEY: &str = "propertyValue";

/// Installation progress of a model element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallStatus {
    NotStarted,
    InProgress,
    PartiallyInstalled,
    Installed,
}

impl InstallStatus {
    pub const ALL: [InstallStatus; 4] = [
        InstallStatus::NotStarted,
        InstallStatus::InProgress,
        InstallStatus::PartiallyInstalled,
        InstallStatus::Installed,
    ];

    /// Cyclic mapping: `(id mod 4) + 1` selects the status code
    pub fn for_node(id: NodeId) -> Self {
        Self::ALL[(id.0 % 4) as usize]
    }

    /// Status code, 1 through 4
    pub fn code(self) -> u8 {
        match self {
            InstallStatus::NotStarted => 1,
            InstallStatus::InProgress => 2,
            InstallStatus::PartiallyInstalled => 3,
            InstallStatus::Installed => 4,
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            InstallStatus::NotStarted => "Not Started",
            InstallStatus::InProgress => "In Progress",
            InstallStatus::PartiallyInstalled => "Partially Installed",
            InstallStatus::Installed => "Installed",
        }
    }
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Serialized form stored in the node status data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValue {
    pub status_code: u8,
    pub status_text: String,
}

impl From<InstallStatus> for PropertyValue {
    fn from(status: InstallStatus) -> Self {
        Self {
            status_code: status.code(),
            status_text: status.text().to_string(),
        }
    }
}

/// Read back the status a node was decorated with
pub fn property_value(graph: &SceneGraph, id: NodeId) -> Option<PropertyValue> {
    let value = graph.node(id)?.user_data.get(PROPERTY_VALUE_KEY)?;
    serde_json::from_value(value.clone()).ok()
}

/// Decorate every mesh at or below `root` with its install status and an
/// overlay label anchored at `label_offset`. Returns the number of meshes
/// decorated.
pub fn decorate_subtree(graph: &mut SceneGraph, root: NodeId, label_offset: Vec3) -> usize {
    let mut decorated = 0;
    for id in graph.descendants(root) {
        let Some(node) = graph.node_mut(id) else {
            continue;
        };
        if !node.is_mesh() {
            continue;
        }
        let status = InstallStatus::for_node(id);
        let value = PropertyValue::from(status);
        match serde_json::to_value(&value) {
            Ok(json) => {
                node.user_data.insert(PROPERTY_VALUE_KEY.to_string(), json);
            }
            Err(e) => {
                debug!(node = %id, error = %e, "Failed to encode status data");
                continue;
            }
        }
        node.label = Some(OverlayLabel::new(status.text(), label_offset));
        decorated += 1;
    }
    debug!(root = %root, meshes = decorated, "Decorated model with installation progress");
    decorated
}
