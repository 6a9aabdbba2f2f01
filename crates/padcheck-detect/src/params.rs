use serde::{Deserialize, Serialize};

use crate::color::Hsv;

/// Closed HSV box. Hue is in degrees `[0, 360]`, saturation and value in percent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HsvRange {
    pub hue: [f32; 2],
    pub saturation: [f32; 2],
    pub value: [f32; 2],
}

impl HsvRange {
    pub const ANY_HUE: [f32; 2] = [0.0, 360.0];
    pub const FULL: [f32; 2] = [0.0, 100.0];

    pub const fn new(hue: [f32; 2], saturation: [f32; 2], value: [f32; 2]) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }

    #[inline]
    pub fn contains(&self, hsv: Hsv) -> bool {
        within(hsv.h, self.hue) && within(hsv.s, self.saturation) && within(hsv.v, self.value)
    }
}

#[inline]
fn within(v: f32, [lo, hi]: [f32; 2]) -> bool {
    v >= lo && v <= hi
}

/// Board materials that are forced to background before any pad test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardExclusions {
    pub blue_substrate: HsvRange,
    pub yellow_edge_plating: HsvRange,
    pub black_component: HsvRange,
    pub gray_component: HsvRange,
    pub golden_connector: HsvRange,
    pub white_component: HsvRange,
}

impl Default for BoardExclusions {
    fn default() -> Self {
        Self {
            blue_substrate: HsvRange::new([200.0, 250.0], [60.0, 100.0], [30.0, 100.0]),
            yellow_edge_plating: HsvRange::new([45.0, 65.0], [70.0, 100.0], [60.0, 100.0]),
            black_component: HsvRange::new(HsvRange::ANY_HUE, HsvRange::FULL, [0.0, 25.0]),
            gray_component: HsvRange::new(HsvRange::ANY_HUE, [0.0, 20.0], [25.0, 70.0]),
            golden_connector: HsvRange::new([35.0, 55.0], [40.0, 80.0], [50.0, 100.0]),
            white_component: HsvRange::new(HsvRange::ANY_HUE, [0.0, 25.0], [80.0, 100.0]),
        }
    }
}

/// Pad material color ranges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PadColorRanges {
    pub magenta: HsvRange,
    pub cyan: HsvRange,
    pub silver: HsvRange,
}

impl Default for PadColorRanges {
    fn default() -> Self {
        Self {
            magenta: HsvRange::new([300.0, 330.0], [45.0, 100.0], [50.0, 95.0]),
            cyan: HsvRange::new([180.0, 200.0], [45.0, 100.0], [50.0, 95.0]),
            silver: HsvRange::new(HsvRange::ANY_HUE, [0.0, 15.0], [75.0, 95.0]),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentationParams {
    #[serde(default)]
    pub exclusions: BoardExclusions,
    #[serde(default)]
    pub pads: PadColorRanges,
}

/// Opening/closing schedule applied to every mask.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphologyParams {
    /// Erosions followed by the same number of dilations.
    pub open_iterations: usize,
    /// Dilations followed by the same number of erosions.
    pub close_iterations: usize,
    /// 4-connected clusters with fewer pixels are zeroed.
    pub min_noise_pixels: usize,
}

impl Default for MorphologyParams {
    fn default() -> Self {
        Self {
            open_iterations: 2,
            close_iterations: 1,
            min_noise_pixels: 25,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentParams {
    /// Seed sampling step on both axes.
    pub seed_stride: usize,
    /// A component is kept only if its pixel count is strictly greater.
    pub min_pixels: usize,
}

impl Default for ComponentParams {
    fn default() -> Self {
        Self {
            seed_stride: 2,
            min_pixels: 200,
        }
    }
}

/// Geometric acceptance window for pad candidates (all bounds exclusive).
///
/// Bounds are in pixels at the working resolution, tuned for a roughly
/// square pad; they are not physically calibrated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateFilterParams {
    pub min_area: f32,
    pub max_area: f32,
    pub min_aspect: f32,
    pub max_aspect: f32,
}

impl Default for CandidateFilterParams {
    fn default() -> Self {
        Self {
            min_area: 200.0,
            max_area: 5000.0,
            min_aspect: 0.5,
            max_aspect: 2.0,
        }
    }
}

impl CandidateFilterParams {
    #[inline]
    pub fn accepts(&self, area: f32, aspect: f32) -> bool {
        area > self.min_area
            && area < self.max_area
            && aspect > self.min_aspect
            && aspect < self.max_aspect
    }
}

/// Full detector configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PadDetectorParams {
    #[serde(default)]
    pub segmentation: SegmentationParams,
    #[serde(default)]
    pub morphology: MorphologyParams,
    #[serde(default)]
    pub components: ComponentParams,
    #[serde(default)]
    pub filter: CandidateFilterParams,
    /// Below this many HSV pad pixels the RGB fallback takes over.
    #[serde(default = "default_min_foreground_pixels")]
    pub min_foreground_pixels: usize,
    /// Confidence assigned to every fallback candidate.
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f32,
}

fn default_min_foreground_pixels() -> usize {
    100
}

fn default_fallback_confidence() -> f32 {
    0.6
}

impl Default for PadDetectorParams {
    fn default() -> Self {
        Self {
            segmentation: SegmentationParams::default(),
            morphology: MorphologyParams::default(),
            components: ComponentParams::default(),
            filter: CandidateFilterParams::default(),
            min_foreground_pixels: default_min_foreground_pixels(),
            fallback_confidence: default_fallback_confidence(),
        }
    }
}
