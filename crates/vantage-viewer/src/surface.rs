//! Snapshot render surfaces
//!
//! The runtime renders into plain snapshots; bevy systems pick up the most
//! recent one and sync entities to it. Nothing here touches the ECS.

use glam::{Mat4, Vec3};
use std::sync::{Arc, Mutex, MutexGuard};
use vantage_core::{Light, NodeContent, NodeId, SceneGraph, Shape};
use vantage_scene::{
    LabelOverlay, PerspectiveCamera, PlacedLabel, ProjectedOverlay, RenderError, RenderSurface,
    ScreenRect,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CameraDraw {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

/// One mesh with its model-space shape
#[derive(Debug, Clone, PartialEq)]
pub struct MeshDraw {
    pub node: NodeId,
    pub transform: Mat4,
    pub shape: Shape,
    /// Linear RGB
    pub color: [f32; 3],
    pub emissive: [f32; 3],
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LightDraw {
    Directional {
        node: NodeId,
        position: Vec3,
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

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    /// sRGB
    pub background: [f32; 3],
    pub camera: CameraDraw,
    pub meshes: Vec<MeshDraw>,
    pub lights: Vec<LightDraw>,
}

impl SceneSnapshot {
    pub fn capture(scene: &SceneGraph, camera: &PerspectiveCamera) -> Self {
        let mut meshes = Vec::new();
        let mut lights = Vec::new();

        for id in scene.traverse() {
            let (Some(node), Some(world)) = (scene.node(id), scene.world_matrix(id)) else {
                continue;
            };
            match &node.content {
                NodeContent::Mesh(mesh) => {
                    if mesh.geometry.shape == Shape::None {
                        continue;
                    }
                    meshes.push(MeshDraw {
                        node: id,
                        transform: world,
                        shape: mesh.geometry.shape.clone(),
                        color: mesh.material.color,
                        emissive: mesh.material.emissive,
                        opacity: mesh.material.opacity,
                    });
                }
                NodeContent::Light(Light::Directional {
                    intensity,
                    cast_shadow,
                    shadow_map_size,
                    shadow_near,
                    shadow_far,
                    ..
                }) => lights.push(LightDraw::Directional {
                    node: id,
                    position: world.w_axis.truncate(),
                    intensity: *intensity,
                    cast_shadow: *cast_shadow,
                    shadow_map_size: *shadow_map_size,
                    shadow_near: *shadow_near,
                    shadow_far: *shadow_far,
                }),
                NodeContent::Light(Light::Ambient { color, intensity }) => {
                    lights.push(LightDraw::Ambient {
                        color: *color,
                        intensity: *intensity,
                    })
                }
                NodeContent::Group => {}
            }
        }

        Self {
            background: scene.background,
            camera: CameraDraw {
                position: camera.position,
                target: camera.target,
                up: camera.up,
                fov_degrees: camera.fov_degrees,
                near: camera.near,
                far: camera.far,
            },
            meshes,
            lights,
        }
    }
}

/// A measured overlay label
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDraw {
    pub node: NodeId,
    pub text: String,
    /// Physical pixels
    pub rect: Option<ScreenRect>,
}

#[derive(Debug, Default)]
struct Presented {
    scene: Option<SceneSnapshot>,
    labels: Option<Vec<LabelDraw>>,
    disposed: bool,
}

/// Hand-off point between the runtime's surfaces and the bevy systems
#[derive(Debug, Clone, Default)]
pub struct FrameSlot(Arc<Mutex<Presented>>);

impl FrameSlot {
    fn lock(&self) -> Result<MutexGuard<'_, Presented>, RenderError> {
        self.0
            .lock()
            .map_err(|_| RenderError::Backend("frame slot poisoned".to_string()))
    }

    pub fn take_scene(&self) -> Option<SceneSnapshot> {
        self.lock().ok()?.scene.take()
    }

    pub fn take_labels(&self) -> Option<Vec<LabelDraw>> {
        self.lock().ok()?.labels.take()
    }

    /// True once either surface has been disposed
    pub fn is_disposed(&self) -> bool {
        self.lock().map(|p| p.disposed).unwrap_or(true)
    }
}

pub struct SnapshotSurface {
    slot: FrameSlot,
    size: (u32, u32),
}

impl SnapshotSurface {
    pub fn new(slot: FrameSlot) -> Self {
        Self { slot, size: (0, 0) }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl RenderSurface for SnapshotSurface {
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        let snapshot = SceneSnapshot::capture(scene, camera);
        let mut presented = self.slot.lock()?;
        if presented.disposed {
            return Err(RenderError::SurfaceLost("scene surface disposed".to_string()));
        }
        presented.scene = Some(snapshot);
        Ok(())
    }

    fn dispose(&mut self) {
        if let Ok(mut presented) = self.slot.lock() {
            presented.disposed = true;
            presented.scene = None;
        }
    }
}

/// Projected overlay that also records label text for presentation
pub struct SnapshotOverlay {
    inner: ProjectedOverlay,
    slot: FrameSlot,
}

impl SnapshotOverlay {
    pub fn new(inner: ProjectedOverlay, slot: FrameSlot) -> Self {
        Self { inner, slot }
    }
}

impl LabelOverlay for SnapshotOverlay {
    fn set_size(&mut self, width: u32, height: u32) {
        self.inner.set_size(width, height);
    }

    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> Result<Vec<PlacedLabel>, RenderError> {
        let placed = self.inner.render(scene, camera)?;
        let labels = placed
            .iter()
            .filter_map(|p| {
                let text = scene.node(p.node)?.label.as_ref()?.text.clone();
                Some(LabelDraw {
                    node: p.node,
                    text,
                    rect: p.rect,
                })
            })
            .collect();
        self.slot.lock()?.labels = Some(labels);
        Ok(placed)
    }

    fn dispose(&mut self) {
        self.inner.dispose();
        if let Ok(mut presented) = self.slot.lock() {
            presented.disposed = true;
            presented.labels = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_core::{Aabb, Geometry, Mesh, OverlayLabel, Transform};
    use vantage_scene::config::LabelConfig;
    use vantage_scene::Viewport;

    fn camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        camera.position = Vec3::new(0.0, 0.0, 10.0);
        camera
    }

    fn scene() -> (SceneGraph, NodeId) {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        graph
            .add_child(
                root,
                "sun",
                "DirectionalLight",
                Transform::from_translation(Vec3::new(5.0, 10.0, 15.0)),
                NodeContent::Light(Light::Directional {
                    color: [1.0; 3],
                    intensity: 1.0,
                    cast_shadow: true,
                    shadow_map_size: 2048,
                    shadow_near: 0.5,
                    shadow_far: 50.0,
                }),
            )
            .unwrap();
        let mesh = graph
            .add_child(
                root,
                "panel",
                "Mesh",
                Transform::from_translation(Vec3::X),
                NodeContent::Mesh(Mesh {
                    geometry: Geometry {
                        bounds: Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)),
                        vertex_count: 8,
                        shape: Shape::Cuboid {
                            size: Vec3::splat(2.0),
                        },
                    },
                    ..Mesh::default()
                }),
            )
            .unwrap();
        graph
            .add_child(root, "empty", "Mesh", Transform::IDENTITY, NodeContent::Mesh(Mesh::default()))
            .unwrap();
        graph.node_mut(mesh).unwrap().label = Some(OverlayLabel::new("Installed", Vec3::ZERO));
        (graph, mesh)
    }

    #[test]
    fn test_capture() {
        let (graph, mesh) = scene();
        let snapshot = SceneSnapshot::capture(&graph, &camera());

        // Meshes without a drawable shape are skipped
        assert_eq!(snapshot.meshes.len(), 1);
        let draw = &snapshot.meshes[0];
        assert_eq!(draw.node, mesh);
        assert_eq!(draw.shape, Shape::Cuboid { size: Vec3::splat(2.0) });
        assert_eq!(draw.transform.w_axis.truncate(), Vec3::X);

        assert!(matches!(
            snapshot.lights[0],
            LightDraw::Directional { position, shadow_map_size: 2048, .. }
                if position == Vec3::new(5.0, 10.0, 15.0)
        ));
        assert_eq!(snapshot.camera.position, Vec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn test_surface_hands_off_latest_frame() {
        let (graph, _) = scene();
        let slot = FrameSlot::default();
        let mut surface = SnapshotSurface::new(slot.clone());
        surface.set_size(640, 480);
        assert_eq!(surface.size(), (640, 480));

        surface.render(&graph, &camera()).unwrap();
        assert!(slot.take_scene().is_some());
        assert!(slot.take_scene().is_none());

        surface.dispose();
        assert!(slot.is_disposed());
        assert!(surface.render(&graph, &camera()).is_err());
    }

    #[test]
    fn test_overlay_records_text() {
        let (graph, mesh) = scene();
        let slot = FrameSlot::default();
        let viewport = Viewport::new(800, 800);
        let mut overlay =
            SnapshotOverlay::new(ProjectedOverlay::new(&LabelConfig::default(), viewport), slot.clone());
        overlay.set_size(800, 800);

        let placed = overlay.render(&graph, &camera()).unwrap();
        assert_eq!(placed.len(), 1);
        let labels = slot.take_labels().unwrap();
        assert_eq!(labels[0].node, mesh);
        assert_eq!(labels[0].text, "Installed");
        assert!(labels[0].rect.is_some());
    }
}
