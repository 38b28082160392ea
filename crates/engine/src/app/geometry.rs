/// Axis-aligned bounding box used for positions and collision tests.
///
/// Extents are never negative; constructing a rect with a negative width or
/// height is a fatal invariant violation rather than a recoverable error.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        assert!(
            width >= 0.0 && height >= 0.0,
            "rect extents must be non-negative: {width}x{height}"
        );
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn set_left(&mut self, left: f32) {
        self.x = left;
    }

    pub fn set_right(&mut self, right: f32) {
        self.x = right - self.width;
    }

    pub fn set_top(&mut self, top: f32) {
        self.y = top;
    }

    pub fn set_bottom(&mut self, bottom: f32) {
        self.y = bottom - self.height;
    }

    pub fn center(&self) -> Vec2 {
        Vec2 {
            x: self.x + self.width * 0.5,
            y: self.y + self.height * 0.5,
        }
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Strict overlap test. Rects that only touch along an edge do not
    /// intersect, so an entity snapped flush against a block is out of
    /// collision while a one-unit ground probe still overlaps its support.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Inclusive point containment, used for GUI hit tests.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_rects_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let flush_right = Rect::new(10.0, 0.0, 10.0, 10.0);
        let flush_below = Rect::new(0.0, 10.0, 10.0, 10.0);
        assert!(!a.intersects(&flush_right));
        assert!(!a.intersects(&flush_below));
    }

    #[test]
    fn edge_setters_move_origin() {
        let mut rect = Rect::new(0.0, 0.0, 40.0, 40.0);
        rect.set_right(100.0);
        assert!((rect.x - 60.0).abs() < 0.0001);
        rect.set_bottom(200.0);
        assert!((rect.y - 160.0).abs() < 0.0001);
        rect.set_left(5.0);
        rect.set_top(6.0);
        assert!((rect.x - 5.0).abs() < 0.0001);
        assert!((rect.y - 6.0).abs() < 0.0001);
    }

    #[test]
    fn contains_point_is_inclusive() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains_point(10.0, 10.0));
        assert!(rect.contains_point(30.0, 30.0));
        assert!(!rect.contains_point(30.1, 30.0));
    }

    #[test]
    #[should_panic]
    fn negative_extent_is_fatal() {
        let _ = Rect::new(0.0, 0.0, -1.0, 10.0);
    }
}
