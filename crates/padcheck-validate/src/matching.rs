//! Per-axis position tolerance between reference and detected pads.

use nalgebra::Point2;
use padcheck_detect::PadCandidate;

use crate::reference::ReferencePad;
use crate::template::TemplatePad;

/// Anything with a normalized center.
pub trait PadPosition {
    fn position(&self) -> Point2<f32>;
}

impl PadPosition for PadCandidate {
    fn position(&self) -> Point2<f32> {
        Point2::new(self.x, self.y)
    }
}

impl PadPosition for ReferencePad {
    fn position(&self) -> Point2<f32> {
        Point2::new(self.x, self.y)
    }
}

impl PadPosition for TemplatePad {
    fn position(&self) -> Point2<f32> {
        Point2::new(self.x, self.y)
    }
}

impl PadPosition for Point2<f32> {
    fn position(&self) -> Point2<f32> {
        *self
    }
}

/// Independent per-axis tolerance, in frame fractions. Not a radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionTolerance(pub f32);

impl PositionTolerance {
    #[inline]
    pub fn matches(self, reference: &impl PadPosition, detected: &impl PadPosition) -> bool {
        let d = reference.position() - detected.position();
        d.x.abs() <= self.0 && d.y.abs() <= self.0
    }

    /// Number of reference pads with at least one detection inside the tolerance.
    ///
    /// A single detection may satisfy several reference pads.
    pub fn count_matched<R: PadPosition, D: PadPosition>(
        self,
        reference: &[R],
        detected: &[D],
    ) -> usize {
        reference
            .iter()
            .filter(|r| detected.iter().any(|d| self.matches(*r, d)))
            .count()
    }
}

impl Default for PositionTolerance {
    fn default() -> Self {
        Self(0.05)
    }
}
