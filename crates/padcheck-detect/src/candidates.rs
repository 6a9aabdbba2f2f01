//! Geometric filtering of components into normalized pad candidates.

use padcheck_core::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::components::Component;
use crate::params::CandidateFilterParams;

/// Display tier derived from a candidate's confidence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence > 0.7 {
            ConfidenceTier::High
        } else if confidence > 0.5 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

/// Which classifier produced the mask a candidate came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CandidateSource {
    /// Primary HSV path; confidence is the component's fill ratio.
    Hsv,
    /// Raw RGB fallback; every candidate gets the same confidence.
    Rgb { confidence: f32 },
}

impl CandidateSource {
    fn id_prefix(self) -> &'static str {
        match self {
            CandidateSource::Hsv => "hsv_pad",
            CandidateSource::Rgb { .. } => "rgb_pad",
        }
    }

    fn confidence(self, component: &Component) -> f32 {
        match self {
            CandidateSource::Hsv => component.fill_ratio(),
            CandidateSource::Rgb { confidence } => confidence.clamp(0.0, 1.0),
        }
    }
}

/// A detected pad, in frame-normalized coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PadCandidate {
    /// Center, as a fraction of frame width/height.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Bounding-box area in pixels.
    pub area: usize,
    pub aspect_ratio: f32,
    pub confidence: f32,
    pub bounding_box: BoundingBox,
    pub id: String,
}

impl PadCandidate {
    pub fn tier(&self) -> ConfidenceTier {
        ConfidenceTier::from_confidence(self.confidence)
    }
}

pub fn filter_candidates(
    components: &[Component],
    frame_width: usize,
    frame_height: usize,
    params: &CandidateFilterParams,
    source: CandidateSource,
) -> Vec<PadCandidate> {
    let fw = frame_width as f32;
    let fh = frame_height as f32;
    let mut out = Vec::new();

    for component in components {
        let bbox = component.bbox;
        let area = bbox.area();
        let aspect_ratio = bbox.aspect_ratio();
        if !params.accepts(area as f32, aspect_ratio) {
            log::debug!(
                "rejected component at ({}, {}): area {area}, aspect {aspect_ratio:.2}",
                bbox.x,
                bbox.y
            );
            continue;
        }

        let (cx, cy) = bbox.center();
        out.push(PadCandidate {
            x: cx / fw,
            y: cy / fh,
            width: bbox.width as f32 / fw,
            height: bbox.height as f32 / fh,
            area,
            aspect_ratio,
            confidence: source.confidence(component),
            bounding_box: bbox,
            id: candidate_id(source, &bbox),
        });
    }
    out
}

fn candidate_id(source: CandidateSource, bbox: &BoundingBox) -> String {
    format!("{}_{}_{}", source.id_prefix(), bbox.x, bbox.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(x: usize, y: usize, w: usize, h: usize, pixels: usize) -> Component {
        Component {
            members: (0..pixels).collect(),
            bbox: BoundingBox {
                x,
                y,
                width: w,
                height: h,
            },
        }
    }

    #[test]
    fn square_pad_is_normalized() {
        let comps = [component(20, 20, 40, 40, 1600)];
        let out = filter_candidates(
            &comps,
            200,
            200,
            &CandidateFilterParams::default(),
            CandidateSource::Hsv,
        );
        assert_eq!(out.len(), 1);
        let pad = &out[0];
        assert_eq!((pad.x, pad.y), (0.2, 0.2));
        assert_eq!((pad.width, pad.height), (0.2, 0.2));
        assert_eq!(pad.area, 1600);
        assert_eq!(pad.confidence, 1.0);
        assert_eq!(pad.tier(), ConfidenceTier::High);
        assert_eq!(pad.id, "hsv_pad_20_20");
    }

    fn accepted_sizes(comps: &[Component]) -> Vec<usize> {
        filter_candidates(
            comps,
            400,
            400,
            &CandidateFilterParams::default(),
            CandidateSource::Hsv,
        )
        .iter()
        .map(|c| c.area)
        .collect()
    }

    #[test]
    fn area_bounds_reject_square_blobs() {
        // No integer box of area exactly 200 or 5000 has an aspect inside
        // (0.5, 2.0); the exact bounds are covered by `CandidateFilterParams::accepts`.
        let comps = [
            component(0, 0, 14, 14, 196),
            component(0, 0, 15, 14, 210),
            component(0, 0, 70, 71, 4970),
            component(0, 0, 71, 71, 5041),
        ];
        assert_eq!(accepted_sizes(&comps), vec![210, 4970]);
    }

    #[test]
    fn aspect_bounds_are_exclusive() {
        let comps = [
            component(0, 0, 40, 20, 800),
            component(0, 0, 20, 40, 800),
            component(0, 0, 39, 20, 780),
            component(0, 0, 21, 40, 840),
        ];
        assert_eq!(accepted_sizes(&comps), vec![780, 840]);
    }

    #[test]
    fn fallback_confidence_is_fixed() {
        let comps = [component(0, 0, 30, 20, 300)];
        let out = filter_candidates(
            &comps,
            100,
            100,
            &CandidateFilterParams::default(),
            CandidateSource::Rgb { confidence: 0.6 },
        );
        assert_eq!(out[0].confidence, 0.6);
        assert_eq!(out[0].tier(), ConfidenceTier::Medium);
        assert!(out[0].id.starts_with("rgb_pad_"));
    }

    #[test]
    fn tiers_use_strict_thresholds() {
        assert_eq!(ConfidenceTier::from_confidence(0.71), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_confidence(0.7), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_confidence(0.5), ConfidenceTier::Low);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let comps = [component(20, 20, 40, 40, 1600)];
        let out = filter_candidates(
            &comps,
            200,
            200,
            &CandidateFilterParams::default(),
            CandidateSource::Hsv,
        );
        let json = serde_json::to_value(&out[0]).expect("json");
        assert!(json.get("aspectRatio").is_some());
        assert!(json.get("boundingBox").is_some());
    }
}
