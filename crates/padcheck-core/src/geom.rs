use serde::{Deserialize, Serialize};

/// Axis-aligned pixel bounding box.
///
/// `x`/`y` are the inclusive minimum corner; `width`/`height` count pixels,
/// so a single pixel has a 1×1 box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl BoundingBox {
    /// Build from inclusive min/max corners.
    pub fn from_min_max(min_x: usize, min_y: usize, max_x: usize, max_y: usize) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Box center in pixel units.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }
}
