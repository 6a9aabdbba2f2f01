//! Board-aware HSV segmentation.
//!
//! Every pixel is first tested against the known board materials. A match
//! forces it to background and the pad tests are skipped, so solder-mask and
//! copper tones that overlap a pad hue can never leak into the mask.

use padcheck_core::{Mask, MASK_ON};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::color::{Hsv, HsvImage};
use crate::params::{HsvRange, SegmentationParams};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardMaterial {
    BlueSubstrate,
    YellowEdgePlating,
    BlackComponent,
    GrayComponent,
    GoldenConnector,
    WhiteComponent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadMaterial {
    Magenta,
    Cyan,
    Silver,
}

/// Outcome of classifying one pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelClass {
    Board(BoardMaterial),
    Pad(PadMaterial),
    Background,
}

impl PixelClass {
    #[inline]
    pub fn is_pad(self) -> bool {
        matches!(self, PixelClass::Pad(_))
    }
}

impl SegmentationParams {
    /// Exclusion ranges in evaluation order.
    pub fn exclusion_ranges(&self) -> [(BoardMaterial, &HsvRange); 6] {
        let e = &self.exclusions;
        [
            (BoardMaterial::BlueSubstrate, &e.blue_substrate),
            (BoardMaterial::YellowEdgePlating, &e.yellow_edge_plating),
            (BoardMaterial::BlackComponent, &e.black_component),
            (BoardMaterial::GrayComponent, &e.gray_component),
            (BoardMaterial::GoldenConnector, &e.golden_connector),
            (BoardMaterial::WhiteComponent, &e.white_component),
        ]
    }

    pub fn pad_ranges(&self) -> [(PadMaterial, &HsvRange); 3] {
        let p = &self.pads;
        [
            (PadMaterial::Magenta, &p.magenta),
            (PadMaterial::Cyan, &p.cyan),
            (PadMaterial::Silver, &p.silver),
        ]
    }
}

pub fn classify_hsv(hsv: Hsv, params: &SegmentationParams) -> PixelClass {
    if let Some((material, _)) = params
        .exclusion_ranges()
        .into_iter()
        .find(|(_, range)| range.contains(hsv))
    {
        return PixelClass::Board(material);
    }
    params
        .pad_ranges()
        .into_iter()
        .find(|(_, range)| range.contains(hsv))
        .map_or(PixelClass::Background, |(material, _)| {
            PixelClass::Pad(material)
        })
}

/// Build the raw (uncleaned) pad mask from an HSV buffer.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(hsv, params), fields(width = hsv.width, height = hsv.height))
)]
pub fn segment_hsv(hsv: &HsvImage, params: &SegmentationParams) -> Mask {
    let mut mask = Mask::new(hsv.width, hsv.height);
    let mut board = 0usize;
    for (dst, &px) in mask.data.iter_mut().zip(&hsv.data) {
        match classify_hsv(px, params) {
            PixelClass::Pad(_) => *dst = MASK_ON,
            PixelClass::Board(_) => board += 1,
            PixelClass::Background => {}
        }
    }
    log::debug!(
        "hsv segmentation: {} pad pixels, {} board pixels excluded",
        mask.count_foreground(),
        board
    );
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::rgb_to_hsv;

    fn classify(h: f32, s: f32, v: f32) -> PixelClass {
        classify_hsv(Hsv::new(h, s, v), &SegmentationParams::default())
    }

    #[test]
    fn pad_colors_are_included() {
        assert_eq!(classify(315.0, 80.0, 80.0), PixelClass::Pad(PadMaterial::Magenta));
        assert_eq!(classify(190.0, 60.0, 70.0), PixelClass::Pad(PadMaterial::Cyan));
        assert_eq!(classify(10.0, 5.0, 77.0), PixelClass::Pad(PadMaterial::Silver));
    }

    #[test]
    fn cyan_on_the_hue_bound_is_a_pad() {
        // H = 200 exactly, S = 58.6: inside cyan, below the substrate saturation.
        let params = SegmentationParams::default();
        assert_eq!(
            classify_hsv(rgb_to_hsv(53, 103, 128), &params),
            PixelClass::Pad(PadMaterial::Cyan)
        );
    }

    #[test]
    fn exclusion_wins_over_inclusion() {
        // H=200 sits in both the cyan pad range and the blue substrate range.
        let px = Hsv::new(200.0, 80.0, 80.0);
        let params = SegmentationParams::default();
        assert!(params.pads.cyan.contains(px));
        assert_eq!(
            classify_hsv(px, &params),
            PixelClass::Board(BoardMaterial::BlueSubstrate)
        );

        // Bright silver overlaps the white/cream exclusion.
        assert!(params.pads.silver.contains(Hsv::new(0.0, 10.0, 90.0)));
        assert_eq!(
            classify(0.0, 10.0, 90.0),
            PixelClass::Board(BoardMaterial::WhiteComponent)
        );

        let hsv = HsvImage::filled(4, 4, px);
        assert!(segment_hsv(&hsv, &params).is_empty());
    }

    #[test]
    fn board_materials_are_recognised() {
        assert_eq!(classify(0.0, 0.0, 10.0), PixelClass::Board(BoardMaterial::BlackComponent));
        assert_eq!(classify(0.0, 10.0, 50.0), PixelClass::Board(BoardMaterial::GrayComponent));
        assert_eq!(classify(55.0, 90.0, 90.0), PixelClass::Board(BoardMaterial::YellowEdgePlating));
        assert_eq!(classify(40.0, 60.0, 70.0), PixelClass::Board(BoardMaterial::GoldenConnector));
        assert_eq!(
            classify_hsv(rgb_to_hsv(20, 60, 160), &SegmentationParams::default()),
            PixelClass::Board(BoardMaterial::BlueSubstrate)
        );
    }

    #[test]
    fn unlisted_color_is_background() {
        assert_eq!(classify(120.0, 80.0, 80.0), PixelClass::Background);
    }

    #[test]
    fn mask_is_binary() {
        let mut hsv = HsvImage::filled(3, 1, Hsv::new(120.0, 80.0, 80.0));
        hsv.data[1] = Hsv::new(315.0, 80.0, 80.0);
        let mask = segment_hsv(&hsv, &SegmentationParams::default());
        assert_eq!(mask.data, vec![0, 255, 0]);
    }
}
