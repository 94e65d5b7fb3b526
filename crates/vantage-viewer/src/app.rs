//! Bevy application setup

use anyhow::{Context, Result};
use bevy::asset::RenderAssetUsages;
use bevy::light::{CascadeShadowConfigBuilder, DirectionalLightShadowMap};
use bevy::math::primitives::ConicalFrustum;
use bevy::mesh::Indices;
use bevy::prelude::*;
use bevy::render::render_resource::PrimitiveTopology;
use bevy::winit::WinitSettings;
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass};
use bevy_picking::{prelude::MeshPickingPlugin, DefaultPickingPlugins};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, warn};
use vantage_core::{NodeId, Shape};
use vantage_scene::{
    FrameOutcome, HttpFetcher, ModelSource, ProjectedOverlay, Viewer, ViewerConfig, Viewport,
};

use crate::hierarchy::{apply_selection, hierarchy_panel, status_indicator, Selection};
use crate::input::{forward_pointer_input, pick_on_click, track_window_size};
use crate::object_json::ObjectJsonDeserializer;
use crate::surface::{FrameSlot, LightDraw, SceneSnapshot, SnapshotOverlay, SnapshotSurface};

/// Lux per unit of light intensity in the scene description
const LUX_PER_INTENSITY: f32 = 4000.0;
/// Ambient brightness per unit of intensity
const AMBIENT_PER_INTENSITY: f32 = 200.0;

/// The runtime viewer plus what keeps it alive. Main-thread only.
pub struct ViewerHost {
    pub viewer: Viewer,
    pub slot: FrameSlot,
    _runtime: tokio::runtime::Runtime,
}

impl ViewerHost {
    pub fn new(config: &ViewerConfig, viewport: Viewport, runtime: tokio::runtime::Runtime) -> Result<Self> {
        let fetcher = HttpFetcher::new(std::time::Duration::from_secs(config.model.timeout_secs))?;
        let slot = FrameSlot::default();
        let surface = SnapshotSurface::new(slot.clone());
        let overlay = SnapshotOverlay::new(ProjectedOverlay::new(&config.labels, viewport), slot.clone());

        let viewer = Viewer::new(
            config,
            viewport,
            Box::new(surface),
            Box::new(overlay),
            ModelSource {
                fetcher: Arc::new(fetcher),
                deserializer: Arc::new(ObjectJsonDeserializer),
                runtime: runtime.handle().clone(),
            },
        )
        .context("Failed to create viewer")?;

        Ok(Self {
            viewer,
            slot,
            _runtime: runtime,
        })
    }
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Entity drawing one mesh node
#[derive(Component)]
pub struct MeshNode(pub NodeId);

/// UI text entity for one overlay label
#[derive(Component)]
pub struct LabelNode(pub NodeId);

/// Bevy entities standing in for scene graph nodes
#[derive(Resource, Default)]
pub struct SceneEntities {
    meshes: HashMap<NodeId, (Entity, Handle<StandardMaterial>)>,
    lights: HashMap<NodeId, Entity>,
    pub labels: HashMap<NodeId, Entity>,
}

/// Run the Bevy application until the window closes
pub fn run(config: ViewerConfig, host: ViewerHost, width: u32, height: u32) -> Result<()> {
    let exit = App::new()
        .insert_resource(ClearColor(Color::srgb(0.2, 0.2, 0.2)))
        .insert_resource(WinitSettings::default())
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Vantage".to_string(),
                resolution: (width, height).into(),
                ..default()
            }),
            ..default()
        }))
        // Picking plugins go before EguiPlugin so egui can detect them
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(MeshPickingPlugin)
        .add_plugins(EguiPlugin::default())
        .insert_non_send_resource(host)
        .insert_resource(HostConfig(config))
        .init_resource::<SceneEntities>()
        .init_resource::<Selection>()
        .add_systems(Startup, setup_camera)
        .add_systems(
            Update,
            (
                track_window_size,
                forward_pointer_input,
                pick_on_click,
                apply_selection,
                drive_viewer,
                present_scene,
                present_labels,
            )
                .chain(),
        )
        .add_systems(EguiPrimaryContextPass, (hierarchy_panel, status_indicator))
        .run();

    if let AppExit::Error(code) = exit {
        anyhow::bail!("Viewer exited with code {code}");
    }
    Ok(())
}

/// Startup configuration, kept for systems that need it
#[derive(Resource)]
pub struct HostConfig(pub ViewerConfig);

fn setup_camera(mut commands: Commands, config: Res<HostConfig>) {
    let camera = &config.0.camera;
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: camera.fov_degrees.to_radians(),
            near: camera.near,
            far: camera.far,
            ..default()
        }),
        Transform::from_translation(Vec3::from_array(camera.position))
            .looking_at(Vec3::from_array(camera.target), Vec3::Y),
        MainCamera,
    ));
}

/// Tick the runtime viewer once per bevy frame
fn drive_viewer(mut host: NonSendMut<ViewerHost>, time: Res<Time>) {
    if !host.viewer.is_usable() {
        return;
    }
    match host.viewer.frame(time.elapsed_secs_f64()) {
        Ok(FrameOutcome::Stopped) => info!("Frame loop stopped"),
        Ok(_) => {}
        Err(e) => error!(error = %e, "Viewer stopped rendering"),
    }
}

/// Sync bevy entities to the latest scene snapshot
#[allow(clippy::too_many_arguments)]
fn present_scene(
    host: NonSend<ViewerHost>,
    mut commands: Commands,
    mut entities: ResMut<SceneEntities>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut clear_color: ResMut<ClearColor>,
    mut shadow_map: ResMut<DirectionalLightShadowMap>,
    mut camera_query: Query<(&mut Transform, &mut Projection), With<MainCamera>>,
) {
    if host.slot.is_disposed() {
        for (_, (entity, _)) in entities.meshes.drain() {
            commands.entity(entity).despawn();
        }
        for (_, entity) in entities.lights.drain() {
            commands.entity(entity).despawn();
        }
        return;
    }
    let Some(snapshot) = host.slot.take_scene() else {
        return;
    };

    let [r, g, b] = snapshot.background;
    clear_color.0 = Color::srgb(r, g, b);

    if let Ok((mut transform, mut projection)) = camera_query.single_mut() {
        let camera = &snapshot.camera;
        *transform = Transform::from_translation(camera.position).looking_at(camera.target, camera.up);
        if let Projection::Perspective(perspective) = projection.as_mut() {
            perspective.fov = camera.fov_degrees.to_radians();
            perspective.near = camera.near;
            perspective.far = camera.far;
        }
    }

    sync_lights(&snapshot, &mut commands, &mut entities, &mut shadow_map);
    sync_meshes(&snapshot, &mut commands, &mut entities, &mut meshes, &mut materials);
}

fn sync_lights(
    snapshot: &SceneSnapshot,
    commands: &mut Commands,
    entities: &mut SceneEntities,
    shadow_map: &mut DirectionalLightShadowMap,
) {
    for light in &snapshot.lights {
        match *light {
            LightDraw::Directional {
                node,
                position,
                intensity,
                cast_shadow,
                shadow_map_size,
                shadow_near,
                shadow_far,
            } => {
                if shadow_map.size != shadow_map_size as usize {
                    shadow_map.size = shadow_map_size as usize;
                }
                let components = (
                    DirectionalLight {
                        illuminance: intensity * LUX_PER_INTENSITY,
                        shadows_enabled: cast_shadow,
                        ..default()
                    },
                    CascadeShadowConfigBuilder {
                        minimum_distance: shadow_near,
                        maximum_distance: shadow_far,
                        ..default()
                    }
                    .build(),
                    Transform::from_translation(position).looking_at(Vec3::ZERO, Vec3::Y),
                );
                match entities.lights.get(&node) {
                    Some(entity) => {
                        commands.entity(*entity).insert(components);
                    }
                    None => {
                        let entity = commands.spawn(components).id();
                        entities.lights.insert(node, entity);
                    }
                }
            }
            LightDraw::Ambient { color, intensity } => {
                let [r, g, b] = color;
                commands.insert_resource(AmbientLight {
                    color: Color::linear_rgb(r, g, b),
                    brightness: intensity * AMBIENT_PER_INTENSITY,
                    ..default()
                });
            }
        }
    }
}

fn sync_meshes(
    snapshot: &SceneSnapshot,
    commands: &mut Commands,
    entities: &mut SceneEntities,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    let mut seen = HashSet::with_capacity(snapshot.meshes.len());
    for draw in &snapshot.meshes {
        seen.insert(draw.node);
        let [r, g, b] = draw.color;
        let [er, eg, eb] = draw.emissive;
        let base_color = Color::linear_rgba(r, g, b, draw.opacity);
        let emissive = LinearRgba::rgb(er, eg, eb);
        let transform = Transform::from_matrix(draw.transform);

        if let Some((entity, handle)) = entities.meshes.get(&draw.node) {
            if let Some(material) = materials.get_mut(handle) {
                material.base_color = base_color;
                material.emissive = emissive;
            }
            commands.entity(*entity).insert(transform);
            continue;
        }

        let Some(mesh) = build_mesh(&draw.shape) else {
            warn!(node = %draw.node, "Mesh has no triangles to draw");
            continue;
        };
        let material = materials.add(StandardMaterial {
            base_color,
            emissive,
            alpha_mode: if draw.opacity < 1.0 {
                AlphaMode::Blend
            } else {
                AlphaMode::Opaque
            },
            ..default()
        });
        let entity = commands
            .spawn((
                Mesh3d(meshes.add(mesh)),
                MeshMaterial3d(material.clone()),
                transform,
                MeshNode(draw.node),
            ))
            .id();
        entities.meshes.insert(draw.node, (entity, material));
    }

    entities.meshes.retain(|node, (entity, _)| {
        let keep = seen.contains(node);
        if !keep {
            commands.entity(*entity).despawn();
        }
        keep
    });
}

/// Bevy mesh for a model-space shape, `None` when nothing is drawable
fn build_mesh(shape: &Shape) -> Option<Mesh> {
    let mesh = match shape {
        Shape::None => return None,
        Shape::Triangles { positions, indices } => {
            if positions.is_empty() || indices.as_ref().is_some_and(|i| i.is_empty()) {
                return None;
            }
            let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
                .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions.to_vec());
            if let Some(indices) = indices {
                mesh.insert_indices(Indices::U32(indices.to_vec()));
            }
            mesh.with_computed_normals()
        }
        Shape::Cuboid { size } => Mesh::from(Cuboid::new(size.x, size.y, size.z)),
        Shape::Sphere { radius } => Mesh::from(Sphere::new(*radius)),
        Shape::Cylinder {
            radius_top,
            radius_bottom,
            height,
        } => Mesh::from(ConicalFrustum {
            radius_top: *radius_top,
            radius_bottom: *radius_bottom,
            height: *height,
        }),
        Shape::Plane { width, height } => Mesh::from(Rectangle::new(*width, *height)),
    };
    Some(mesh)
}

/// Position label text over the 3D view, honouring declutter results
fn present_labels(
    host: NonSend<ViewerHost>,
    mut commands: Commands,
    mut entities: ResMut<SceneEntities>,
    config: Res<HostConfig>,
    windows: Query<&Window>,
    mut label_query: Query<(&mut Node, &mut Text, &mut Visibility), With<LabelNode>>,
) {
    let Some(labels) = host.slot.take_labels() else {
        if host.slot.is_disposed() {
            for (_, entity) in entities.labels.drain() {
                commands.entity(entity).despawn();
            }
        }
        return;
    };
    let scale = windows.single().map(|w| w.scale_factor()).unwrap_or(1.0);
    let scene = host.viewer.scene();
    let [pad_x, pad_y] = config.0.labels.padding;

    for label in labels {
        let shown = scene
            .node(label.node)
            .and_then(|n| n.label.as_ref())
            .is_some_and(|l| l.visible && l.in_view);
        let (left, top) = label
            .rect
            .map(|r| (r.left / scale, r.top / scale))
            .unwrap_or_default();
        let visibility = if shown && label.rect.is_some() {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };

        if let Some(entity) = entities.labels.get(&label.node) {
            if let Ok((mut node, mut text, mut vis)) = label_query.get_mut(*entity) {
                node.left = Val::Px(left);
                node.top = Val::Px(top);
                if text.0 != label.text {
                    text.0 = label.text;
                }
                *vis = visibility;
            }
            continue;
        }

        let entity = commands
            .spawn((
                Text::new(label.text),
                TextFont {
                    font_size: config.0.labels.font_size / scale,
                    ..default()
                },
                TextColor(Color::BLACK),
                BackgroundColor(Color::srgba(1.0, 1.0, 1.0, 0.85)),
                Node {
                    position_type: PositionType::Absolute,
                    left: Val::Px(left),
                    top: Val::Px(top),
                    padding: UiRect::axes(Val::Px(pad_x / scale), Val::Px(pad_y / scale)),
                    ..default()
                },
                visibility,
                LabelNode(label.node),
            ))
            .id();
        entities.labels.insert(label.node, entity);
    }
}
