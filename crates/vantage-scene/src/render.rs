//! Render backend seam
//!
//! The runtime never talks to a GPU. Hosts plug in a `RenderSurface` for
//! the 3D scene and a `LabelOverlay` for the 2D labels; both are sized to
//! the viewport and rendered from the scene graph and camera.

use thiserror::Error;
use vantage_core::{NodeId, SceneGraph};

use crate::camera::PerspectiveCamera;
use crate::declutter::ScreenRect;

/// Drawable area in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height; 1.0 for an empty viewport
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Render surface lost: {0}")]
    SurfaceLost(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Where one overlay label ended up on screen
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLabel {
    pub node: NodeId,
    /// Screen rectangle, `None` when the label could not be measured
    pub rect: Option<ScreenRect>,
    /// Whether the anchor lies inside the clip volume
    pub in_view: bool,
}

/// 3D scene renderer
pub trait RenderSurface {
    fn set_size(&mut self, width: u32, height: u32);

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera)
        -> Result<(), RenderError>;

    /// Release backend resources. Called once.
    fn dispose(&mut self);
}

/// 2D label renderer
///
/// `render` returns one entry per labelled node, in document order.
pub trait LabelOverlay {
    fn set_size(&mut self, width: u32, height: u32);

    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> Result<Vec<PlacedLabel>, RenderError>;

    fn dispose(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_aspect() {
        assert_eq!(Viewport::new(800, 400).aspect(), 2.0);
        assert_eq!(Viewport::new(800, 0).aspect(), 1.0);
    }
}
