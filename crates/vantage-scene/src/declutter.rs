//! Label declutter pass
//!
//! Greedy and first-seen-wins: labels are visited in document order and a
//! label is hidden as soon as its rectangle touches one already accepted.
//! Quadratic in the label count, which is fine for the few hundred labels a
//! model carries.

/// Axis-aligned screen rectangle in pixels, y growing downward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl ScreenRect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(
            cx - width / 2.0,
            cy - height / 2.0,
            cx + width / 2.0,
            cy + height / 2.0,
        )
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Zero-size (or inverted) rectangles cannot be measured
    pub fn is_measurable(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    /// Inclusive test: rectangles sharing an edge overlap
    pub fn overlaps(&self, other: &ScreenRect) -> bool {
        !(self.right < other.left
            || self.left > other.right
            || self.bottom < other.top
            || self.top > other.bottom)
    }
}

/// Decide visibility for labels given in document order
///
/// Unmeasured labels (`None` or zero size) stay visible and never block
/// later labels.
pub fn declutter<I>(rects: I) -> Vec<bool>
where
    I: IntoIterator<Item = Option<ScreenRect>>,
{
    let mut accepted: Vec<ScreenRect> = Vec::new();
    rects
        .into_iter()
        .map(|rect| match rect {
            Some(rect) if rect.is_measurable() => {
                if accepted.iter().any(|other| rect.overlaps(other)) {
                    false
                } else {
                    accepted.push(rect);
                    true
                }
            }
            _ => true,
        })
        .collect()
}
