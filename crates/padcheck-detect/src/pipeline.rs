use padcheck_core::RgbaImageView;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::candidates::{filter_candidates, CandidateSource, PadCandidate};
use crate::color::rgba_to_hsv;
use crate::components::extract_components;
use crate::error::DetectError;
use crate::fallback::detect_pads_rgb;
use crate::morphology::clean_board_mask;
use crate::params::PadDetectorParams;
use crate::segment::segment_hsv;

/// Why the RGB detector was used instead of the HSV path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FallbackReason {
    /// HSV segmentation found fewer pad pixels than the configured minimum.
    InsufficientSignal { foreground: usize },
    /// The HSV path could not run on this frame.
    PrimaryFailed,
}

/// Which detector produced the candidates of one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum DetectionPath {
    Primary,
    Fallback(FallbackReason),
    /// Both detectors failed; the candidate list is empty.
    Failed,
}

/// Candidates plus a short account of how they were obtained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PadDetection {
    pub candidates: Vec<PadCandidate>,
    pub path: DetectionPath,
    /// HSV foreground pixel count, when segmentation ran.
    pub hsv_foreground: Option<usize>,
}

/// Stateless pad detector; each call owns all of its scratch buffers.
#[derive(Clone, Debug, Default)]
pub struct PadDetector {
    params: PadDetectorParams,
}

impl PadDetector {
    pub fn new(params: PadDetectorParams) -> Self {
        Self { params }
    }

    /// Detector parameters.
    #[inline]
    pub fn params(&self) -> &PadDetectorParams {
        &self.params
    }

    /// Detect pads in a frame.
    ///
    /// Never fails: a frame neither detector can process yields an empty list.
    pub fn detect(&self, frame: &RgbaImageView<'_>) -> Vec<PadCandidate> {
        self.detect_with_report(frame).candidates
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn detect_with_report(&self, frame: &RgbaImageView<'_>) -> PadDetection {
        let foreground = match self.primary(frame) {
            Ok(Primary::Done(candidates, foreground)) => {
                log::info!(
                    "hsv path: {} pad candidates ({foreground} foreground px)",
                    candidates.len()
                );
                return PadDetection {
                    candidates,
                    path: DetectionPath::Primary,
                    hsv_foreground: Some(foreground),
                };
            }
            Ok(Primary::Insufficient(foreground)) => {
                log::warn!(
                    "hsv segmentation found {foreground} px (< {}), using rgb fallback",
                    self.params.min_foreground_pixels
                );
                Some(foreground)
            }
            Err(err) => {
                log::warn!("hsv path failed: {err}, using rgb fallback");
                None
            }
        };

        let reason = match foreground {
            Some(foreground) => FallbackReason::InsufficientSignal { foreground },
            None => FallbackReason::PrimaryFailed,
        };
        match detect_pads_rgb(frame, &self.params) {
            Ok(candidates) => {
                log::info!("rgb fallback: {} pad candidates", candidates.len());
                PadDetection {
                    candidates,
                    path: DetectionPath::Fallback(reason),
                    hsv_foreground: foreground,
                }
            }
            Err(err) => {
                log::warn!("rgb fallback failed: {err}");
                PadDetection {
                    candidates: Vec::new(),
                    path: DetectionPath::Failed,
                    hsv_foreground: foreground,
                }
            }
        }
    }

    fn primary(&self, frame: &RgbaImageView<'_>) -> Result<Primary, DetectError> {
        frame.validate()?;
        let hsv = rgba_to_hsv(frame);
        let raw = segment_hsv(&hsv, &self.params.segmentation);
        let foreground = raw.count_foreground();
        if foreground < self.params.min_foreground_pixels {
            return Ok(Primary::Insufficient(foreground));
        }

        let cleaned = clean_board_mask(&raw, &self.params.morphology);
        let components = extract_components(&cleaned, &self.params.components);
        let candidates = filter_candidates(
            &components,
            frame.width,
            frame.height,
            &self.params.filter,
            CandidateSource::Hsv,
        );
        Ok(Primary::Done(candidates, foreground))
    }
}

enum Primary {
    Done(Vec<PadCandidate>, usize),
    Insufficient(usize),
}
