use glam::Vec2;

/// Pointer position in window pixels, origin top-left.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Normalized device coordinates (x right, y up). `None` for a
    /// degenerate viewport.
    pub fn to_ndc(&self, sample: PointerSample) -> Option<Vec2> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            sample.x / self.width * 2.0 - 1.0,
            1.0 - sample.y / self.height * 2.0,
        ))
    }
}
