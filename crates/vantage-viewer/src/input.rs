//! Window and pointer input forwarded to the viewer runtime

use bevy::input::mouse::{AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;
use bevy_egui::EguiContexts;
use tracing::debug;
use vantage_core::{NodeId, SceneGraph};
use vantage_scene::PointerButton;

use crate::app::{MainCamera, ViewerHost};
use crate::hierarchy::Selection;

/// Pixel scroll distance that counts as one wheel notch
const PIXELS_PER_NOTCH: f32 = 100.0;

fn egui_wants_pointer(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false)
}

/// Cursor position in normalized device coordinates, y up
pub fn cursor_ndc(cursor: Vec2, window_size: Vec2) -> Option<Vec2> {
    if window_size.x <= 0.0 || window_size.y <= 0.0 {
        return None;
    }
    Some(Vec2::new(
        cursor.x / window_size.x * 2.0 - 1.0,
        1.0 - cursor.y / window_size.y * 2.0,
    ))
}

/// Resize the viewer when the window's physical size changes
pub fn track_window_size(
    mut host: NonSendMut<ViewerHost>,
    windows: Query<&Window>,
    mut last: Local<Option<UVec2>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let size = window.physical_size();
    if *last == Some(size) {
        return;
    }
    *last = Some(size);
    host.viewer.resize(size.x, size.y);
}

/// Drive the camera rig from mouse buttons, motion and the wheel
pub fn forward_pointer_input(
    mut host: NonSendMut<ViewerHost>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    scroll: Res<AccumulatedMouseScroll>,
    windows: Query<&Window>,
    mut contexts: EguiContexts,
    mut last_cursor: Local<Option<Vec2>>,
) {
    if !host.viewer.is_usable() {
        return;
    }
    let Ok(window) = windows.single() else {
        return;
    };
    let cursor = window.cursor_position();
    let previous = std::mem::replace(&mut *last_cursor, cursor);
    let ndc = cursor.and_then(|c| cursor_ndc(c, window.size()));
    let rig = host.viewer.rig_mut();

    if mouse_button.get_just_released().next().is_some() && mouse_button.get_pressed().next().is_none() {
        rig.pointer_released();
    }

    if egui_wants_pointer(&mut contexts) {
        return;
    }

    let held = if mouse_button.pressed(MouseButton::Left) {
        Some(PointerButton::Left)
    } else if mouse_button.pressed(MouseButton::Middle) {
        Some(PointerButton::Middle)
    } else if mouse_button.pressed(MouseButton::Right) {
        Some(PointerButton::Right)
    } else {
        None
    };
    if let (Some(button), Some(now), Some(before)) = (held, cursor, previous) {
        let delta = (now - before) * window.scale_factor();
        if delta != Vec2::ZERO {
            rig.pointer_drag(button, delta, ndc);
        }
    }

    let notches = match scroll.unit {
        MouseScrollUnit::Line => scroll.delta.y,
        MouseScrollUnit::Pixel => scroll.delta.y / PIXELS_PER_NOTCH,
    };
    if notches != 0.0 {
        rig.wheel(notches, ndc);
    }
}

/// Closest mesh node hit by a world-space ray
pub fn closest_mesh(scene: &SceneGraph, origin: Vec3, direction: Vec3) -> Option<NodeId> {
    let mut closest: Option<(f32, NodeId)> = None;
    for id in scene.traverse() {
        if !scene.node(id).is_some_and(|n| n.is_mesh()) {
            continue;
        }
        let Some(t) = scene.world_bounds(id).ray_intersection(origin, direction) else {
            continue;
        };
        if closest.is_none_or(|(best, _)| t < best) {
            closest = Some((t, id));
        }
    }
    closest.map(|(_, id)| id)
}

/// Select the mesh under the cursor on left click
pub fn pick_on_click(
    host: NonSend<ViewerHost>,
    mut selection: ResMut<Selection>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    mut contexts: EguiContexts,
) {
    if !mouse_button.just_pressed(MouseButton::Left) || egui_wants_pointer(&mut contexts) {
        return;
    }
    if host.viewer.model().is_none() {
        return;
    }
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor) else {
        return;
    };

    if let Some(node) = closest_mesh(host.viewer.scene(), ray.origin, *ray.direction) {
        debug!(node = %node, "Picked mesh");
        selection.pending = Some(node);
    }
}
