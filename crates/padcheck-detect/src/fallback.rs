//! Raw RGB detector used when HSV segmentation finds too little pad material.
//!
//! Same exclusion-first structure as the HSV path, expressed as channel
//! inequalities. It shares morphology, component extraction and the
//! geometric filter with the primary path, and can be called on its own.

use padcheck_core::{Mask, RgbaImageView, MASK_ON};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::candidates::{filter_candidates, CandidateSource, PadCandidate};
use crate::components::extract_components;
use crate::error::DetectError;
use crate::morphology::clean_board_mask;
use crate::params::PadDetectorParams;
use crate::segment::{BoardMaterial, PadMaterial, PixelClass};

#[inline]
fn near(a: u8, b: u8, tol: i16) -> bool {
    (a as i16 - b as i16).abs() < tol
}

fn board_material_rgb(r: u8, g: u8, b: u8) -> Option<BoardMaterial> {
    let (ri, gi, bi) = (r as i16, g as i16, b as i16);
    if bi > ri + 30 && bi > gi + 30 && b > 100 {
        Some(BoardMaterial::BlueSubstrate)
    } else if r > 180 && g > 150 && b < 100 && ri > bi + 80 {
        Some(BoardMaterial::YellowEdgePlating)
    } else if r < 50 && g < 50 && b < 50 {
        Some(BoardMaterial::BlackComponent)
    } else if near(r, g, 20) && near(g, b, 20) && r > 50 && r < 150 {
        Some(BoardMaterial::GrayComponent)
    } else if r > 150 && g > 120 && b < 80 && ri > gi + 20 {
        Some(BoardMaterial::GoldenConnector)
    } else if r > 200 && g > 200 && b > 200 {
        Some(BoardMaterial::WhiteComponent)
    } else {
        None
    }
}

fn pad_material_rgb(r: u8, g: u8, b: u8) -> Option<PadMaterial> {
    let (ri, gi, bi) = (r as i16, g as i16, b as i16);
    let silver_channel = |c: u8| c > 150 && c < 220;
    if r > 120 && ri > gi + 30 && ri > bi + 10 && g < 150 && b > 80 {
        Some(PadMaterial::Magenta)
    } else if bi > ri + 30 && gi > ri + 20 && b > 120 && g > 120 && r < 120 {
        Some(PadMaterial::Cyan)
    } else if near(r, g, 15)
        && near(g, b, 15)
        && silver_channel(r)
        && silver_channel(g)
        && silver_channel(b)
    {
        Some(PadMaterial::Silver)
    } else {
        None
    }
}

/// Classify one pixel from its raw channels; board materials win.
pub fn classify_rgb(r: u8, g: u8, b: u8) -> PixelClass {
    if let Some(material) = board_material_rgb(r, g, b) {
        return PixelClass::Board(material);
    }
    pad_material_rgb(r, g, b).map_or(PixelClass::Background, PixelClass::Pad)
}

pub fn segment_rgb(frame: &RgbaImageView<'_>) -> Result<Mask, DetectError> {
    frame.validate()?;
    let mut mask = Mask::new(frame.width, frame.height);
    for (dst, [r, g, b]) in mask.data.iter_mut().zip(frame.rgb_pixels()) {
        if classify_rgb(r, g, b).is_pad() {
            *dst = MASK_ON;
        }
    }
    Ok(mask)
}

/// Run the complete RGB detector on a frame.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, params), fields(width = frame.width, height = frame.height))
)]
pub fn detect_pads_rgb(
    frame: &RgbaImageView<'_>,
    params: &PadDetectorParams,
) -> Result<Vec<PadCandidate>, DetectError> {
    let raw = segment_rgb(frame)?;
    log::debug!("rgb segmentation: {} pad pixels", raw.count_foreground());

    let cleaned = clean_board_mask(&raw, &params.morphology);
    let components = extract_components(&cleaned, &params.components);
    Ok(filter_candidates(
        &components,
        frame.width,
        frame.height,
        &params.filter,
        CandidateSource::Rgb {
            confidence: params.fallback_confidence,
        },
    ))
}
