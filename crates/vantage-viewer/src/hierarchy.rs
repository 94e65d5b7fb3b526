//! Model hierarchy panel and load status indicator

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use tracing::warn;
use vantage_core::{NodeId, SceneGraph};
use vantage_scene::LoadStatus;

use crate::app::ViewerHost;

/// Emissive colour of the selected mesh
const HIGHLIGHT: [f32; 3] = [0.0, 1.0, 0.0];

/// Currently highlighted mesh
#[derive(Resource, Default)]
pub struct Selection {
    /// Node picked this frame, applied by `apply_selection`
    pub pending: Option<NodeId>,
    /// Highlighted node and the emissive it had before
    current: Option<(NodeId, [f32; 3])>,
}

impl Selection {
    pub fn selected(&self) -> Option<NodeId> {
        self.current.map(|(node, _)| node)
    }
}

/// Move the highlight to the pending pick, restoring the previous mesh
pub fn apply_selection(mut host: NonSendMut<ViewerHost>, mut selection: ResMut<Selection>) {
    let Some(node) = selection.pending.take() else {
        return;
    };
    if selection.selected() == Some(node) || !host.viewer.is_usable() {
        return;
    }

    if let Some((previous, emissive)) = selection.current.take() {
        // The previous node may be gone after a reload
        if let Err(e) = host.viewer.set_highlight(previous, emissive) {
            warn!(node = %previous, error = %e, "Failed to clear highlight");
        }
    }

    let original = host
        .viewer
        .scene()
        .node(node)
        .and_then(|n| n.mesh())
        .map(|m| m.material.emissive);
    let Some(original) = original else {
        return;
    };
    match host.viewer.set_highlight(node, HIGHLIGHT) {
        Ok(true) => selection.current = Some((node, original)),
        Ok(false) => {}
        Err(e) => warn!(node = %node, error = %e, "Failed to highlight"),
    }
}

/// Indicator text and colour for a load status, `None` when idle
pub fn status_badge(status: LoadStatus) -> Option<(&'static str, egui::Color32)> {
    match status {
        LoadStatus::Idle => None,
        LoadStatus::Loading => Some(("Loading model…", egui::Color32::from_rgb(200, 200, 200))),
        LoadStatus::Error => Some(("Failed to load model", egui::Color32::from_rgb(255, 100, 100))),
    }
}

/// Loading and error indicator in the top right corner
pub fn status_indicator(host: NonSend<ViewerHost>, mut contexts: EguiContexts) {
    let Ok(ctx) = contexts.ctx_mut() else { return };
    let Some((text, color)) = status_badge(host.viewer.status()) else {
        return;
    };

    egui::Area::new(egui::Id::new("load_status"))
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-12.0, 12.0))
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    if host.viewer.status() == LoadStatus::Loading {
                        ui.spinner();
                    }
                    ui.label(egui::RichText::new(text).color(color).size(14.0));
                });
            });
        });
}

/// Side panel listing the loaded model's nodes. Hidden until a model is
/// attached.
pub fn hierarchy_panel(
    host: NonSend<ViewerHost>,
    mut selection: ResMut<Selection>,
    mut contexts: EguiContexts,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };
    let Some(model) = host.viewer.model() else {
        return;
    };
    let scene = host.viewer.scene();
    let selected = selection.selected();

    egui::SidePanel::left("hierarchy_panel")
        .default_width(260.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.heading(egui::RichText::new("Hierarchy").size(18.0));
            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| {
                if let Some(picked) = node_ui(ui, scene, model, selected) {
                    selection.pending = Some(picked);
                }
            });
        });
}

/// Draw one node and its children. Returns the mesh clicked, if any.
fn node_ui(ui: &mut egui::Ui, scene: &SceneGraph, id: NodeId, selected: Option<NodeId>) -> Option<NodeId> {
    let node = scene.node(id)?;
    let mut text = egui::RichText::new(row_text(scene, id)).size(13.0);
    if !node.is_mesh() {
        text = text.color(egui::Color32::GRAY);
    }

    if node.children.is_empty() {
        let response = ui.selectable_label(selected == Some(id), text);
        return (response.clicked() && node.is_mesh()).then_some(id);
    }

    let mut picked = None;
    egui::CollapsingHeader::new(text)
        .id_salt(id.0)
        .default_open(id == scene.root() || node.parent == Some(scene.root()))
        .show(ui, |ui| {
            if node.is_mesh() && ui.selectable_label(selected == Some(id), "select").clicked() {
                picked = Some(id);
            }
            for child in &node.children {
                if let Some(child_pick) = node_ui(ui, scene, *child, selected) {
                    picked = Some(child_pick);
                }
            }
        });
    picked
}

/// Row caption: display name plus the overlay label text, if any
pub fn row_text(scene: &SceneGraph, id: NodeId) -> String {
    let Some(node) = scene.node(id) else {
        return String::new();
    };
    match &node.label {
        Some(label) => format!("{} ({})", node.display_name(), label.text),
        None => node.display_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_core::{NodeContent, OverlayLabel, Transform};

    #[test]
    fn test_status_badge() {
        assert!(status_badge(LoadStatus::Idle).is_none());
        assert_eq!(status_badge(LoadStatus::Loading).unwrap().0, "Loading model…");
        assert_eq!(status_badge(LoadStatus::Error).unwrap().0, "Failed to load model");
    }

    #[test]
    fn test_row_text() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let node = graph
            .add_child(root, "bracket", "Group", Transform::IDENTITY, NodeContent::Group)
            .unwrap();
        assert_eq!(row_text(&graph, node), "bracket");

        graph.node_mut(node).unwrap().label =
            Some(OverlayLabel::new("Installed", glam::Vec3::ZERO));
        assert_eq!(row_text(&graph, node), "bracket (Installed)");
        assert_eq!(row_text(&graph, NodeId(9999)), "");
    }

    #[test]
    fn test_selection_starts_empty() {
        let selection = Selection::default();
        assert!(selection.selected().is_none());
        assert!(selection.pending.is_none());
    }
}
