//! 4-connected component extraction on a binary mask.

use padcheck_core::{BoundingBox, Mask, MASK_ON};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::ComponentParams;

/// One connected foreground blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    /// Linear indices (`y * width + x`) of every member pixel.
    pub members: Vec<usize>,
    pub bbox: BoundingBox,
}

impl Component {
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.members.len()
    }

    /// Member pixels as `(x, y)` for a mask of the given width.
    pub fn pixels(&self, width: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.members.iter().map(move |&i| (i % width, i / width))
    }

    /// Fraction of the bounding box covered by member pixels.
    pub fn fill_ratio(&self) -> f32 {
        (self.pixel_count() as f32 / self.bbox.area() as f32).clamp(0.0, 1.0)
    }
}

/// Fixed-size visited set, one bit per pixel.
#[derive(Clone, Debug)]
struct VisitedBits {
    words: Vec<u64>,
}

impl VisitedBits {
    fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
        }
    }

    #[inline]
    fn test(&self, i: usize) -> bool {
        self.words[i / 64] & (1u64 << (i % 64)) != 0
    }

    #[inline]
    fn insert(&mut self, i: usize) {
        self.words[i / 64] |= 1u64 << (i % 64);
    }
}

/// Reusable flood-fill scratch: a visited bitset sized to the mask and an
/// array-backed work stack.
#[derive(Clone, Debug)]
pub struct ComponentLabeler {
    width: usize,
    height: usize,
    visited: VisitedBits,
    stack: Vec<usize>,
}

impl ComponentLabeler {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            visited: VisitedBits::new(width * height),
            stack: Vec::new(),
        }
    }

    /// Fill the component containing `(x, y)` into `members`.
    ///
    /// Returns `None` when the seed is background or already labeled.
    pub fn flood_fill(
        &mut self,
        mask: &Mask,
        x: usize,
        y: usize,
        members: &mut Vec<usize>,
    ) -> Option<BoundingBox> {
        debug_assert_eq!((mask.width, mask.height), (self.width, self.height));
        let w = self.width;
        let seed = y * w + x;
        if mask.data[seed] != MASK_ON || self.visited.test(seed) {
            return None;
        }

        members.clear();
        self.stack.clear();
        self.visited.insert(seed);
        self.stack.push(seed);

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);
        while let Some(idx) = self.stack.pop() {
            members.push(idx);
            let (px, py) = (idx % w, idx / w);
            min_x = min_x.min(px);
            max_x = max_x.max(px);
            min_y = min_y.min(py);
            max_y = max_y.max(py);

            if px + 1 < w {
                self.visit(mask, idx + 1);
            }
            if px > 0 {
                self.visit(mask, idx - 1);
            }
            if py + 1 < self.height {
                self.visit(mask, idx + w);
            }
            if py > 0 {
                self.visit(mask, idx - w);
            }
        }

        Some(BoundingBox::from_min_max(min_x, min_y, max_x, max_y))
    }

    #[inline]
    fn visit(&mut self, mask: &Mask, idx: usize) {
        if mask.data[idx] == MASK_ON && !self.visited.test(idx) {
            self.visited.insert(idx);
            self.stack.push(idx);
        }
    }
}

/// Label components seeded on a `seed_stride` grid and keep the large ones.
///
/// The full component is filled from each seed, but blobs thinner than the
/// stride on every sampled row and column are never seeded and go unseen.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(mask, params), fields(width = mask.width, height = mask.height))
)]
pub fn extract_components(mask: &Mask, params: &ComponentParams) -> Vec<Component> {
    let stride = params.seed_stride.max(1);
    let mut labeler = ComponentLabeler::new(mask.width, mask.height);
    let mut members = Vec::new();
    let mut out = Vec::new();
    let mut discarded = 0usize;

    for y in (0..mask.height).step_by(stride) {
        for x in (0..mask.width).step_by(stride) {
            let Some(bbox) = labeler.flood_fill(mask, x, y, &mut members) else {
                continue;
            };
            if members.len() > params.min_pixels {
                out.push(Component {
                    members: std::mem::take(&mut members),
                    bbox,
                });
            } else {
                discarded += 1;
            }
        }
    }

    log::debug!(
        "components: kept {}, discarded {} at or below {} px",
        out.len(),
        discarded,
        params.min_pixels
    );
    out
}
