use super::geometry::{Rect, Vec2};

/// Scrolling viewport into the level. The camera tracks a focus rect and
/// clamps its offset so the view never shows space outside the level bounds.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub level_width: f32,
    pub level_height: f32,
    offset: Vec2,
}

impl Camera {
    pub fn new(viewport_width: f32, viewport_height: f32, level_width: f32, level_height: f32) -> Self {
        Self {
            viewport_width,
            viewport_height,
            level_width,
            level_height,
            offset: Vec2::default(),
        }
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Re-centers on the focus rect, then clamps each axis to
    /// `[0, level_extent - viewport_extent]`. A level no larger than the
    /// viewport pins the axis at zero.
    pub fn update(&mut self, focus: &Rect) {
        let center = focus.center();
        let max_x = (self.level_width - self.viewport_width).max(0.0);
        let max_y = (self.level_height - self.viewport_height).max(0.0);
        self.offset.x = (center.x - self.viewport_width * 0.5).clamp(0.0, max_x);
        self.offset.y = (center.y - self.viewport_height * 0.5).clamp(0.0, max_y);
    }

    /// World rect to screen-space rect under the current offset.
    pub fn apply(&self, rect: &Rect) -> Rect {
        rect.translated(-self.offset.x, -self.offset.y)
    }

    /// Whether any part of the rect is inside the current view.
    pub fn sees(&self, rect: &Rect) -> bool {
        let view = Rect {
            x: self.offset.x,
            y: self.offset.y,
            width: self.viewport_width,
            height: self.viewport_height,
        };
        view.intersects(rect)
    }
}
