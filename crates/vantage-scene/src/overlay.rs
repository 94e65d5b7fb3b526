//! Label overlay that measures labels by projection alone
//!
//! Text width is estimated from the character count, so the overlay can
//! place labels without a text shaper. Hosts that draw labels themselves
//! wrap this and reuse its rectangles.

use glam::Vec2;
use tracing::trace;
use vantage_core::SceneGraph;

use crate::camera::PerspectiveCamera;
use crate::config::LabelConfig;
use crate::declutter::ScreenRect;
use crate::render::{LabelOverlay, PlacedLabel, RenderError, Viewport};

/// Average glyph advance as a fraction of the font size
const CHAR_WIDTH_EM: f32 = 0.6;
const LINE_HEIGHT_EM: f32 = 1.2;

#[derive(Debug, Clone)]
pub struct ProjectedOverlay {
    viewport: Viewport,
    font_size: f32,
    padding: Vec2,
    disposed: bool,
}

impl ProjectedOverlay {
    pub fn new(config: &LabelConfig, viewport: Viewport) -> Self {
        Self {
            viewport,
            font_size: config.font_size,
            padding: Vec2::from_array(config.padding),
            disposed: false,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Estimated box size of a label showing `text`
    pub fn label_size(&self, text: &str) -> Vec2 {
        let chars = text.chars().count() as f32;
        Vec2::new(
            chars * CHAR_WIDTH_EM * self.font_size + 2.0 * self.padding.x,
            LINE_HEIGHT_EM * self.font_size + 2.0 * self.padding.y,
        )
    }

    /// Lay out every label in document order
    pub fn place(&self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Vec<PlacedLabel> {
        let width = self.viewport.width as f32;
        let height = self.viewport.height as f32;

        scene
            .labelled_nodes()
            .into_iter()
            .filter_map(|id| {
                let text = &scene.node(id)?.label.as_ref()?.text;
                let anchor = scene.label_anchor(id)?;
                let ndc = camera
                    .project(anchor)
                    .filter(|ndc| ndc.to_array().iter().all(|c| (-1.0..=1.0).contains(c)));
                let Some(ndc) = ndc else {
                    return Some(PlacedLabel {
                        node: id,
                        rect: None,
                        in_view: false,
                    });
                };

                let size = self.label_size(text);
                let cx = (ndc.x + 1.0) * 0.5 * width;
                let cy = (1.0 - ndc.y) * 0.5 * height;
                Some(PlacedLabel {
                    node: id,
                    rect: Some(ScreenRect::from_center(cx, cy, size.x, size.y)),
                    in_view: true,
                })
            })
            .collect()
    }
}

impl LabelOverlay for ProjectedOverlay {
    fn set_size(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
    }

    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> Result<Vec<PlacedLabel>, RenderError> {
        if self.disposed {
            return Err(RenderError::SurfaceLost("label overlay disposed".to_string()));
        }
        let placed = self.place(scene, camera);
        trace!(labels = placed.len(), "Placed overlay labels");
        Ok(placed)
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}
