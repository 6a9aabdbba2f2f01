//! Rule-based gap pad detection.
//!
//! Pipeline:
//! - convert the RGBA frame to HSV,
//! - mark pad-colored pixels, after forcing known board materials to background,
//! - clean the mask (opening, closing, small-cluster removal),
//! - extract 4-connected components seeded on a stride grid,
//! - keep pad-shaped components as normalized [`PadCandidate`]s.
//!
//! When the HSV mask is too sparse the same stages run on a raw RGB
//! classification instead (see [`fallback`]). [`PadDetector::detect`] never
//! fails; [`PadDetector::detect_with_report`] says which path ran.
//!
//! ```
//! use padcheck_core::RgbaImage;
//! use padcheck_detect::PadDetector;
//!
//! let mut frame = RgbaImage::filled(200, 200, [20, 60, 160]);
//! frame.fill_rect(20, 20, 40, 40, [230, 40, 200]);
//! frame.fill_rect(140, 140, 40, 40, [230, 40, 200]);
//!
//! let pads = PadDetector::default().detect(&frame.view());
//! assert_eq!(pads.len(), 2);
//! ```

pub mod candidates;
pub mod color;
pub mod components;
mod error;
pub mod fallback;
pub mod morphology;
mod params;
mod pipeline;
pub mod segment;

pub use candidates::{filter_candidates, CandidateSource, ConfidenceTier, PadCandidate};
pub use color::{rgb_to_hsv, rgba_to_hsv, Hsv, HsvImage};
pub use components::{extract_components, Component, ComponentLabeler};
pub use error::DetectError;
pub use fallback::{classify_rgb, detect_pads_rgb, segment_rgb};
pub use morphology::{clean_board_mask, dilate, erode, remove_small_components};
pub use params::{
    BoardExclusions, CandidateFilterParams, ComponentParams, HsvRange, MorphologyParams,
    PadColorRanges, PadDetectorParams, SegmentationParams,
};
pub use pipeline::{DetectionPath, FallbackReason, PadDetection, PadDetector};
pub use segment::{classify_hsv, segment_hsv, BoardMaterial, PadMaterial, PixelClass};
