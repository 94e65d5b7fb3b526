//! Viewer lifecycle
//!
//! A `Viewer` owns the scene graph, camera rig, render scheduler, the two
//! render surfaces and the model loader. The host drives it with `frame`
//! once per presentation and forwards resizes and pointer input.

use glam::Vec3;
use std::f32::consts::FRAC_PI_2;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use vantage_core::{
    decorate_subtree, GraphError, Light, NodeContent, NodeId, SceneDeserializer, SceneGraph,
    Transform,
};

use crate::camera::{CameraRig, PerspectiveCamera, RigSettings};
use crate::config::{parse_hex_color, SceneConfig, ViewerConfig};
use crate::declutter::declutter;
use crate::loader::{LoadOutcome, LoadTask, ModelLoader, PayloadFetcher};
use crate::render::{LabelOverlay, RenderError, RenderSurface, Viewport};
use crate::scheduler::{FrameOutcome, FrameTarget, RenderScheduler};
use crate::status::{LoadStatus, LoadStatusChannel};

const FALLBACK_BACKGROUND: [f32; 3] = [0.2, 0.2, 0.2];

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Render fault: {0}")]
    RenderFault(#[from] RenderError),
    #[error("Viewer has been disposed")]
    Disposed,
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Where the model comes from and how it is built
pub struct ModelSource<F: PayloadFetcher> {
    pub fetcher: Arc<F>,
    pub deserializer: Arc<dyn SceneDeserializer>,
    /// Runtime the load task is spawned on
    pub runtime: Handle,
}

pub struct Viewer {
    id: Uuid,
    scene: SceneGraph,
    rig: CameraRig,
    scheduler: RenderScheduler,
    surface: Box<dyn RenderSurface>,
    overlay: Box<dyn LabelOverlay>,
    loader: ModelLoader,
    load_task: Option<LoadTask>,
    status: LoadStatusChannel,
    model: Option<NodeId>,
    label_offset: Vec3,
    disposed: Arc<AtomicBool>,
}

impl Viewer {
    /// Build the default scene, size the surfaces and start loading the
    /// model in the background
    pub fn new<F: PayloadFetcher>(
        config: &ViewerConfig,
        viewport: Viewport,
        mut surface: Box<dyn RenderSurface>,
        mut overlay: Box<dyn LabelOverlay>,
        source: ModelSource<F>,
    ) -> Result<Self, ViewerError> {
        let id = Uuid::new_v4();
        info!(
            viewer = %id,
            url = %config.model.url,
            width = viewport.width,
            height = viewport.height,
            "init viewer"
        );

        let scene = default_scene(&config.scene)?;
        let rig = CameraRig::new(&config.camera, RigSettings::from(&config.controls), viewport);
        surface.set_size(viewport.width, viewport.height);
        overlay.set_size(viewport.width, viewport.height);

        let status = LoadStatusChannel::new();
        let disposed = Arc::new(AtomicBool::new(false));
        let loader = ModelLoader::new(config.model.url.clone(), status.clone(), disposed.clone());
        let load_task = loader.start(source.fetcher, source.deserializer, &source.runtime);

        Ok(Self {
            id,
            scene,
            rig,
            scheduler: RenderScheduler::new(),
            surface,
            overlay,
            loader,
            load_task: Some(load_task),
            status,
            model: None,
            label_offset: Vec3::from_array(config.labels.offset),
            disposed,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        self.rig.camera()
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    /// Mutable rig access for forwarding pointer input
    pub fn rig_mut(&mut self) -> &mut CameraRig {
        &mut self.rig
    }

    /// Root of the loaded model, once attached
    pub fn model(&self) -> Option<NodeId> {
        self.model
    }

    pub fn status(&self) -> LoadStatus {
        self.status.get()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<LoadStatus> {
        self.status.subscribe()
    }

    /// The in-flight load, for hosts that want to await it. Taken once.
    pub fn take_load_task(&mut self) -> Option<LoadTask> {
        self.load_task.take()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// False once disposed or after a render fault
    pub fn is_usable(&self) -> bool {
        !self.is_disposed() && !self.scheduler.is_faulted()
    }

    pub fn redraw_requested(&self) -> bool {
        self.scheduler.redraw_requested()
    }

    pub fn request_redraw(&mut self) {
        self.scheduler.request_redraw();
    }

    /// Run one frame at host time `now_seconds`
    pub fn frame(&mut self, now_seconds: f64) -> Result<FrameOutcome, ViewerError> {
        if !self.is_usable() {
            return Ok(FrameOutcome::Stopped);
        }
        self.apply_pending_load();

        let mut target = FrameParts {
            scene: &mut self.scene,
            rig: &mut self.rig,
            surface: self.surface.as_mut(),
            overlay: self.overlay.as_mut(),
        };
        let outcome = self.scheduler.tick(now_seconds, &mut target)?;
        Ok(outcome)
    }

    /// Attach a finished load. Runs inside `frame` so attach, fit,
    /// decoration and the status change land between two draws.
    fn apply_pending_load(&mut self) {
        let Some(outcome) = self.loader.take_pending() else {
            return;
        };
        if self.is_disposed() {
            return;
        }

        match outcome {
            LoadOutcome::Built(mut subtree) => {
                subtree.transform.rotate_local_x(-FRAC_PI_2);
                let root = self.scene.root();
                let model = match self.scene.graft(root, subtree) {
                    Ok(model) => model,
                    Err(e) => {
                        error!(viewer = %self.id, error = %e, "Failed to attach model");
                        self.status.publish(LoadStatus::Error);
                        return;
                    }
                };

                let bounds = self.scene.world_bounds(model);
                if !self.rig.fit_to_bounds(&bounds, false) {
                    debug!(viewer = %self.id, "Model has no volume, camera left as is");
                }
                let labels = decorate_subtree(&mut self.scene, model, self.label_offset);
                self.model = Some(model);
                self.scheduler.request_redraw();
                info!(viewer = %self.id, model = %model, labels, "Model attached");
                self.status.publish(LoadStatus::Idle);
            }
            LoadOutcome::NoDescription => {
                // A payload without a scene description is swallowed: the
                // viewer goes back to idle with no model and no error.
                // TODO: publish LoadStatus::Error here once the status carries
                // a reason the hierarchy panel can show.
                warn!(viewer = %self.id, url = %self.loader.url(), "No model in payload");
                self.status.publish(LoadStatus::Idle);
            }
            LoadOutcome::Failed(message) => {
                error!(viewer = %self.id, error = %message, "Model load failed");
                self.status.publish(LoadStatus::Error);
            }
        }
    }

    /// Follow a viewport size change
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.is_disposed() {
            return;
        }
        debug!(viewer = %self.id, width, height, "Resize");
        self.rig.set_viewport(Viewport::new(width, height));
        self.surface.set_size(width, height);
        self.overlay.set_size(width, height);
        self.scheduler.request_redraw();
    }

    /// Set the emissive colour of a mesh node. Returns false for nodes
    /// without a mesh.
    pub fn set_highlight(&mut self, node: NodeId, emissive: [f32; 3]) -> Result<bool, ViewerError> {
        if self.is_disposed() {
            return Err(ViewerError::Disposed);
        }
        let target = self
            .scene
            .node_mut(node)
            .ok_or(GraphError::UnknownNode(node))?;
        let Some(mesh) = target.mesh_mut() else {
            return Ok(false);
        };
        mesh.material.emissive = emissive;
        self.scheduler.request_redraw();
        Ok(true)
    }

    /// Tear everything down. Safe to call more than once and while a load
    /// is still running.
    pub fn dispose(&mut self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.surface.dispose();
        self.overlay.dispose();
        self.rig.dispose();
        self.scene.clear();
        self.model = None;
        self.scheduler.stop();
        info!(viewer = %self.id, "Viewer disposed");
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Background colour, a shadow-casting key light and an ambient fill
fn default_scene(config: &SceneConfig) -> Result<SceneGraph, GraphError> {
    let mut scene = SceneGraph::new();
    scene.background = parse_hex_color(&config.background).unwrap_or_else(|| {
        warn!(background = %config.background, "Invalid background colour, using grey");
        FALLBACK_BACKGROUND
    });

    let root = scene.root();
    let light = &config.directional_light;
    scene.add_child(
        root,
        "DirectionalLight",
        "DirectionalLight",
        Transform::from_translation(Vec3::from_array(light.position)),
        NodeContent::Light(Light::Directional {
            color: [1.0, 1.0, 1.0],
            intensity: light.intensity,
            cast_shadow: light.cast_shadow,
            shadow_map_size: light.shadow_map_size,
            shadow_near: light.shadow_near,
            shadow_far: light.shadow_far,
        }),
    )?;
    scene.add_child(
        root,
        "AmbientLight",
        "AmbientLight",
        Transform::IDENTITY,
        NodeContent::Light(Light::Ambient {
            color: [1.0, 1.0, 1.0],
            intensity: config.ambient_intensity,
        }),
    )?;
    Ok(scene)
}

/// Borrowed view of the viewer parts a scheduler tick drives
struct FrameParts<'a> {
    scene: &'a mut SceneGraph,
    rig: &'a mut CameraRig,
    surface: &'a mut dyn RenderSurface,
    overlay: &'a mut dyn LabelOverlay,
}

impl FrameTarget for FrameParts<'_> {
    fn advance(&mut self, delta_seconds: f32) -> bool {
        self.rig.advance(delta_seconds)
    }

    fn redraw(&mut self) -> Result<(), RenderError> {
        let camera = self.rig.camera();
        self.surface.render(self.scene, camera)?;
        let placed = self.overlay.render(self.scene, camera)?;

        let visible = declutter(placed.iter().map(|label| label.rect));
        for (entry, visible) in placed.iter().zip(visible) {
            if let Some(label) = self
                .scene
                .node_mut(entry.node)
                .and_then(|node| node.label.as_mut())
            {
                label.visible = visible;
                label.in_view = entry.in_view;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabelConfig;
    use crate::loader::{LoadError, LoadReport};
    use crate::overlay::ProjectedOverlay;
    use crate::render::PlacedLabel;
    use glam::Quat;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tokio::sync::Notify;
    use vantage_core::decorate::property_value;
    use vantage_core::{
        Aabb, DeserializeError, Geometry, InstallStatus, Mesh, NodeSubtree, PropertyValue,
    };

    #[derive(Debug, Default)]
    struct SurfaceLog {
        renders: usize,
        sizes: Vec<(u32, u32)>,
        disposes: usize,
        fail: bool,
    }

    #[derive(Clone, Default)]
    struct RecordingSurface(Arc<Mutex<SurfaceLog>>);

    impl RenderSurface for RecordingSurface {
        fn set_size(&mut self, width: u32, height: u32) {
            self.0.lock().unwrap().sizes.push((width, height));
        }

        fn render(&mut self, _: &SceneGraph, _: &PerspectiveCamera) -> Result<(), RenderError> {
            let mut log = self.0.lock().unwrap();
            if log.fail {
                return Err(RenderError::Backend("device lost".to_string()));
            }
            log.renders += 1;
            Ok(())
        }

        fn dispose(&mut self) {
            self.0.lock().unwrap().disposes += 1;
        }
    }

    #[derive(Clone, Default)]
    struct NullOverlay(Arc<Mutex<SurfaceLog>>);

    impl LabelOverlay for NullOverlay {
        fn set_size(&mut self, width: u32, height: u32) {
            self.0.lock().unwrap().sizes.push((width, height));
        }

        fn render(
            &mut self,
            _: &SceneGraph,
            _: &PerspectiveCamera,
        ) -> Result<Vec<PlacedLabel>, RenderError> {
            self.0.lock().unwrap().renders += 1;
            Ok(Vec::new())
        }

        fn dispose(&mut self) {
            self.0.lock().unwrap().disposes += 1;
        }
    }

    struct StaticFetcher(Value);

    impl PayloadFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<Value, LoadError> {
            Ok(self.0.clone())
        }
    }

    struct DownFetcher;

    impl PayloadFetcher for DownFetcher {
        async fn fetch(&self, url: &str) -> Result<Value, LoadError> {
            Err(LoadError::Transport {
                url: url.to_string(),
                message: "timed out".to_string(),
            })
        }
    }

    /// Holds the fetch open until released
    struct GatedFetcher {
        gate: Arc<Notify>,
        payload: Value,
    }

    impl PayloadFetcher for GatedFetcher {
        async fn fetch(&self, _url: &str) -> Result<Value, LoadError> {
            self.gate.notified().await;
            Ok(self.payload.clone())
        }
    }

    /// Two overlapping unit boxes under one group
    struct TwoBoxes;

    impl SceneDeserializer for TwoBoxes {
        fn build(&self, _description: &Value) -> Result<NodeSubtree, DeserializeError> {
            let cube = || Mesh {
                geometry: Geometry {
                    bounds: Aabb::from_center_size(Vec3::ZERO, Vec3::ONE),
                    vertex_count: 24,
                    ..Geometry::default()
                },
                ..Mesh::default()
            };
            Ok(NodeSubtree::group("model")
                .with_child(NodeSubtree::mesh("a", cube()))
                .with_child(NodeSubtree::mesh("b", cube())))
        }
    }

    fn payload() -> Value {
        json!({
            "result": {
                "metadata": { "type": "Object" },
                "object": { "type": "Group" }
            }
        })
    }

    fn source<F: PayloadFetcher>(fetcher: F) -> ModelSource<F> {
        ModelSource {
            fetcher: Arc::new(fetcher),
            deserializer: Arc::new(TwoBoxes),
            runtime: Handle::current(),
        }
    }

    fn viewer<F: PayloadFetcher>(fetcher: F) -> (Viewer, RecordingSurface, NullOverlay) {
        let surface = RecordingSurface::default();
        let overlay = NullOverlay::default();
        let viewer = Viewer::new(
            &ViewerConfig::default(),
            Viewport::new(800, 600),
            Box::new(surface.clone()),
            Box::new(overlay.clone()),
            source(fetcher),
        )
        .unwrap();
        (viewer, surface, overlay)
    }

    async fn finish_load(viewer: &mut Viewer) -> Result<LoadReport, LoadError> {
        viewer.take_load_task().unwrap().finished().await
    }

    #[tokio::test]
    async fn test_construction_defaults() {
        let (mut viewer, surface, overlay) = viewer(GatedFetcher {
            gate: Arc::new(Notify::new()),
            payload: payload(),
        });
        assert_eq!(viewer.status(), LoadStatus::Loading);
        assert!(viewer.redraw_requested());
        assert_eq!(surface.0.lock().unwrap().sizes, vec![(800, 600)]);
        assert_eq!(overlay.0.lock().unwrap().sizes, vec![(800, 600)]);

        let scene = viewer.scene();
        assert!(scene.background.iter().all(|c| (c - 0.2).abs() < 1e-6));
        let lights: Vec<_> = scene
            .traverse()
            .into_iter()
            .filter_map(|id| match &scene.node(id)?.content {
                NodeContent::Light(light) => Some(light.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(lights.len(), 2);
        assert!(matches!(
            lights[0],
            Light::Directional { cast_shadow: true, shadow_map_size: 2048, .. }
        ));
        assert!(matches!(lights[1], Light::Ambient { intensity, .. } if intensity == 1.5));

        let camera = viewer.camera();
        assert_eq!(camera.fov_degrees, 75.0);
        assert!((camera.position - Vec3::splat(10.0)).length() < 1e-4);

        assert_eq!(viewer.frame(0.0).unwrap(), FrameOutcome::Redrawn);
        assert_eq!(viewer.frame(0.016).unwrap(), FrameOutcome::Skipped);
        assert_eq!(surface.0.lock().unwrap().renders, 1);
        assert_eq!(overlay.0.lock().unwrap().renders, 1);
    }

    #[tokio::test]
    async fn test_successful_load_attaches_model() {
        let (mut viewer, _, _) = viewer(StaticFetcher(payload()));
        let mut status = viewer.subscribe_status();
        assert_eq!(*status.borrow_and_update(), LoadStatus::Loading);

        assert_eq!(finish_load(&mut viewer).await.unwrap(), LoadReport::Built { nodes: 3 });
        // Not attached until the frame loop runs
        assert!(viewer.model().is_none());
        assert_eq!(viewer.frame(0.0).unwrap(), FrameOutcome::Redrawn);

        assert!(status.has_changed().unwrap());
        assert_eq!(viewer.status(), LoadStatus::Idle);
        let model = viewer.model().unwrap();
        let scene = viewer.scene();
        assert_eq!(scene.node(model).unwrap().parent, Some(scene.root()));

        let rotation = scene.node(model).unwrap().transform.rotation;
        assert!(rotation.abs_diff_eq(Quat::from_rotation_x(-FRAC_PI_2), 1e-5));

        let meshes: Vec<NodeId> = scene
            .descendants(model)
            .into_iter()
            .filter(|id| scene.node(*id).is_some_and(|n| n.is_mesh()))
            .collect();
        assert_eq!(meshes.len(), 2);
        for id in meshes {
            let expected = PropertyValue::from(InstallStatus::for_node(id));
            assert_eq!(property_value(scene, id), Some(expected.clone()));
            assert_eq!(scene.node(id).unwrap().label.as_ref().unwrap().text, expected.status_text);
        }

        // Camera framed the model
        let bounds = scene.world_bounds(model);
        for corner in bounds.corners() {
            let ndc = viewer.camera().project(corner).unwrap();
            assert!(ndc.abs().max_element() <= 1.0);
        }
    }

    #[tokio::test]
    async fn test_transport_failure_publishes_error() {
        let (mut viewer, surface, _) = viewer(DownFetcher);
        assert!(finish_load(&mut viewer).await.is_err());

        assert_eq!(viewer.frame(0.0).unwrap(), FrameOutcome::Redrawn);
        assert_eq!(viewer.status(), LoadStatus::Error);
        assert!(viewer.model().is_none());
        assert_eq!(viewer.scene().len(), 3);

        // The loop keeps running
        viewer.request_redraw();
        assert_eq!(viewer.frame(0.1).unwrap(), FrameOutcome::Redrawn);
        assert_eq!(surface.0.lock().unwrap().renders, 2);
        assert!(viewer.is_usable());
    }

    #[tokio::test]
    async fn test_payload_without_description_goes_idle() {
        let (mut viewer, _, _) = viewer(StaticFetcher(json!({ "items": [] })));
        assert_eq!(finish_load(&mut viewer).await.unwrap(), LoadReport::NoDescription);
        viewer.frame(0.0).unwrap();
        assert_eq!(viewer.status(), LoadStatus::Idle);
        assert!(viewer.model().is_none());
        assert!(viewer.is_usable());
    }

    #[tokio::test]
    async fn test_dispose_during_load() {
        let gate = Arc::new(Notify::new());
        let (mut viewer, _, _) = viewer(GatedFetcher {
            gate: gate.clone(),
            payload: payload(),
        });
        let task = viewer.take_load_task().unwrap();
        viewer.dispose();
        gate.notify_one();

        assert_eq!(task.finished().await.unwrap(), LoadReport::Cancelled);
        assert_eq!(viewer.frame(1.0).unwrap(), FrameOutcome::Stopped);
        assert!(viewer.model().is_none());
        assert_eq!(viewer.scene().len(), 1);
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent() {
        let (mut viewer, surface, overlay) = viewer(StaticFetcher(payload()));
        viewer.frame(0.0).unwrap();
        viewer.dispose();
        viewer.dispose();

        assert_eq!(surface.0.lock().unwrap().disposes, 1);
        assert_eq!(overlay.0.lock().unwrap().disposes, 1);
        assert!(!viewer.rig().is_enabled());
        assert_eq!(viewer.frame(0.5).unwrap(), FrameOutcome::Stopped);
        assert_eq!(surface.0.lock().unwrap().renders, 1);

        // Resize listener is gone
        viewer.resize(100, 100);
        assert_eq!(surface.0.lock().unwrap().sizes.len(), 1);
        assert!(matches!(
            viewer.set_highlight(NodeId(1), [0.0, 1.0, 0.0]),
            Err(ViewerError::Disposed)
        ));
    }

    #[tokio::test]
    async fn test_resize_sequence() {
        let (mut viewer, surface, _) = viewer(StaticFetcher(payload()));
        for (width, height) in [(1024, 768), (300, 900), (1920, 1080)] {
            viewer.frame(0.0).unwrap();
            viewer.resize(width, height);
            assert!((viewer.camera().aspect - width as f32 / height as f32).abs() < 1e-6);
            assert!(viewer.redraw_requested());
        }
        assert_eq!(surface.0.lock().unwrap().sizes.last(), Some(&(1920, 1080)));
    }

    #[tokio::test]
    async fn test_overlapping_labels_first_wins() {
        let mut config = ViewerConfig::default();
        // Both boxes share a centre, so their labels land on the same spot
        config.labels.offset = [0.0; 3];
        let viewport = Viewport::new(800, 600);
        let mut viewer = Viewer::new(
            &config,
            viewport,
            Box::new(RecordingSurface::default()),
            Box::new(ProjectedOverlay::new(&LabelConfig::default(), viewport)),
            source(StaticFetcher(payload())),
        )
        .unwrap();
        finish_load(&mut viewer).await.unwrap();
        assert_eq!(viewer.frame(0.0).unwrap(), FrameOutcome::Redrawn);

        let scene = viewer.scene();
        let labels: Vec<_> = scene
            .labelled_nodes()
            .into_iter()
            .filter_map(|id| scene.node(id)?.label.clone())
            .collect();
        assert_eq!(labels.len(), 2);
        assert!(labels[0].visible);
        assert!(labels[0].in_view);
        assert!(!labels[1].visible);
    }

    #[tokio::test]
    async fn test_render_fault_stops_viewer() {
        let (mut viewer, surface, _) = viewer(StaticFetcher(payload()));
        surface.0.lock().unwrap().fail = true;

        assert!(matches!(viewer.frame(0.0), Err(ViewerError::RenderFault(_))));
        assert!(!viewer.is_usable());
        assert_eq!(viewer.frame(0.1).unwrap(), FrameOutcome::Stopped);
    }

    #[tokio::test]
    async fn test_faulted_viewer_ignores_finished_load() {
        let gate = Arc::new(Notify::new());
        let (mut viewer, surface, _) = viewer(GatedFetcher {
            gate: gate.clone(),
            payload: payload(),
        });
        surface.0.lock().unwrap().fail = true;
        assert!(viewer.frame(0.0).is_err());

        gate.notify_one();
        finish_load(&mut viewer).await.unwrap();
        assert_eq!(viewer.frame(0.1).unwrap(), FrameOutcome::Stopped);
        assert!(viewer.model().is_none());
        assert_eq!(viewer.status(), LoadStatus::Loading);
        assert_eq!(viewer.scene().len(), 3);
    }

    #[tokio::test]
    async fn test_highlight_requests_redraw() {
        let (mut viewer, _, _) = viewer(StaticFetcher(payload()));
        finish_load(&mut viewer).await.unwrap();
        viewer.frame(0.0).unwrap();
        assert!(!viewer.redraw_requested());

        let model = viewer.model().unwrap();
        let mesh = viewer.scene().node(model).unwrap().children[0];
        assert!(viewer.set_highlight(mesh, [0.0, 1.0, 0.0]).unwrap());
        assert!(viewer.redraw_requested());
        let material = &viewer.scene().node(mesh).unwrap().mesh().unwrap().material;
        assert_eq!(material.emissive, [0.0, 1.0, 0.0]);

        assert!(!viewer.set_highlight(model, [0.0, 1.0, 0.0]).unwrap());
        assert!(matches!(
            viewer.set_highlight(NodeId(9999), [0.0; 3]),
            Err(ViewerError::Graph(GraphError::UnknownNode(_)))
        ));
    }
}
