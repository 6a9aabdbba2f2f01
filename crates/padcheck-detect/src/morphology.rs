//! Binary morphology with a 3×3 structuring element.
//!
//! Only interior pixels are rewritten; the outermost one-pixel border of the
//! mask keeps whatever value it had before each pass.

use padcheck_core::{Mask, MASK_OFF, MASK_ON};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::components::ComponentLabeler;
use crate::params::MorphologyParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Erode,
    Dilate,
}

fn apply_3x3(mask: &Mask, iterations: usize, op: Op) -> Mask {
    let (w, h) = (mask.width, mask.height);
    let mut src = mask.clone();
    if w < 3 || h < 3 {
        return src;
    }

    let mut dst = src.clone();
    for _ in 0..iterations {
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let mut on = 0usize;
                for ny in y - 1..=y + 1 {
                    let row = &src.data[ny * w + x - 1..=ny * w + x + 1];
                    on += row.iter().filter(|&&v| v == MASK_ON).count();
                }
                let keep = match op {
                    Op::Erode => on == 9,
                    Op::Dilate => on > 0,
                };
                dst.data[y * w + x] = if keep { MASK_ON } else { MASK_OFF };
            }
        }
        std::mem::swap(&mut src, &mut dst);
    }
    src
}

/// A pixel stays foreground only if its whole 3×3 window is foreground.
pub fn erode(mask: &Mask, iterations: usize) -> Mask {
    apply_3x3(mask, iterations, Op::Erode)
}

/// A pixel becomes foreground if any pixel of its 3×3 window is foreground.
pub fn dilate(mask: &Mask, iterations: usize) -> Mask {
    apply_3x3(mask, iterations, Op::Dilate)
}

/// Zero every 4-connected cluster with fewer than `min_size` pixels.
pub fn remove_small_components(mask: &Mask, min_size: usize) -> Mask {
    let mut out = mask.clone();
    let mut labeler = ComponentLabeler::new(mask.width, mask.height);
    let mut members = Vec::new();
    let mut removed = 0usize;

    for y in 0..mask.height {
        for x in 0..mask.width {
            if labeler.flood_fill(mask, x, y, &mut members).is_none() {
                continue;
            }
            if members.len() < min_size {
                removed += 1;
                for &idx in &members {
                    out.data[idx] = MASK_OFF;
                }
            }
        }
    }
    if removed > 0 {
        log::debug!("removed {removed} noise clusters below {min_size} px");
    }
    out
}

/// Opening, closing and small-cluster removal tuned for board imagery.
///
/// Opening drops trace-width noise while restoring the size of real pads;
/// closing fills pin-holes inside a pad blob.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(mask, params), fields(width = mask.width, height = mask.height))
)]
pub fn clean_board_mask(mask: &Mask, params: &MorphologyParams) -> Mask {
    let opened = dilate(
        &erode(mask, params.open_iterations),
        params.open_iterations,
    );
    let closed = erode(
        &dilate(&opened, params.close_iterations),
        params.close_iterations,
    );
    remove_small_components(&closed, params.min_noise_pixels)
}
