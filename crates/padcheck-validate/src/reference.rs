//! Known-good pad layouts keyed by board serial and side.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use padcheck_core::BoundingBox;
use padcheck_detect::PadCandidate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardSide {
    Front,
    Back,
}

impl BoardSide {
    pub fn as_str(self) -> &'static str {
        match self {
            BoardSide::Front => "front",
            BoardSide::Back => "back",
        }
    }
}

impl fmt::Display for BoardSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown board side '{0}' (expected 'front' or 'back')")]
pub struct ParseBoardSideError(String);

impl FromStr for BoardSide {
    type Err = ParseBoardSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(BoardSide::Front),
            "back" => Ok(BoardSide::Back),
            _ => Err(ParseBoardSideError(s.to_string())),
        }
    }
}

/// `SERIAL_side`, e.g. `SN-001_front`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceKey(String);

impl ReferenceKey {
    /// Normalize the serial (trimmed, uppercase) and append the side.
    pub fn new(serial: &str, side: BoardSide) -> Result<Self, ValidationError> {
        let serial = normalize_serial(serial)?;
        Ok(Self(format!("{serial}_{side}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize_serial(serial: &str) -> Result<String, ValidationError> {
    let serial = serial.trim();
    if serial.is_empty() {
        return Err(ValidationError::InvalidSerial);
    }
    Ok(serial.to_uppercase())
}

/// A pad position stored as known good.
///
/// Detected pads keep their pixel geometry; manually taught pads carry the
/// template pad's name and required flag instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencePad {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl From<PadCandidate> for ReferencePad {
    fn from(c: PadCandidate) -> Self {
        Self {
            x: c.x,
            y: c.y,
            width: c.width,
            height: c.height,
            confidence: c.confidence,
            id: c.id,
            area: Some(c.area),
            aspect_ratio: Some(c.aspect_ratio),
            bounding_box: Some(c.bounding_box),
            name: None,
            required: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRecord {
    pub key: ReferenceKey,
    pub serial: String,
    pub side: BoardSide,
    /// Opaque locator of the captured frame (path, URL or data URI).
    #[serde(default, rename = "imageData", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "padPositions")]
    pub pads: Vec<ReferencePad>,
}

/// Build a reference record from a fresh detection, stamped with the current time.
///
/// An empty detection is refused unless `allow_empty` is set.
pub fn capture_reference(
    key: &ReferenceKey,
    image: Option<String>,
    candidates: Vec<PadCandidate>,
    allow_empty: bool,
) -> Result<ReferenceRecord, ValidationError> {
    if candidates.is_empty() && !allow_empty {
        return Err(ValidationError::NoPadsDetected);
    }
    let (serial, side) = split_key(key);
    if candidates.is_empty() {
        log::warn!("storing reference {key} without any pad positions");
    } else {
        log::info!("captured reference {key} with {} pads", candidates.len());
    }
    Ok(ReferenceRecord {
        key: key.clone(),
        serial,
        side,
        image,
        timestamp: Utc::now(),
        pads: candidates.into_iter().map(ReferencePad::from).collect(),
    })
}

fn split_key(key: &ReferenceKey) -> (String, BoardSide) {
    // Keys are only built by `ReferenceKey::new`, so the suffix is always a side.
    match key.0.rsplit_once('_') {
        Some((serial, "back")) => (serial.to_string(), BoardSide::Back),
        Some((serial, _)) => (serial.to_string(), BoardSide::Front),
        None => (key.0.clone(), BoardSide::Front),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(x: f32, y: f32) -> PadCandidate {
        PadCandidate {
            x,
            y,
            width: 0.2,
            height: 0.2,
            area: 1600,
            aspect_ratio: 1.0,
            confidence: 0.9,
            bounding_box: BoundingBox {
                x: 20,
                y: 20,
                width: 40,
                height: 40,
            },
            id: "hsv_pad_20_20".to_string(),
        }
    }

    #[test]
    fn key_is_trimmed_and_uppercased() {
        let key = ReferenceKey::new("  sn-001a ", BoardSide::Back).expect("key");
        assert_eq!(key.as_str(), "SN-001A_back");
        assert_eq!(
            ReferenceKey::new("   ", BoardSide::Front),
            Err(ValidationError::InvalidSerial)
        );
    }

    #[test]
    fn side_parses_case_insensitively() {
        assert_eq!("Front".parse::<BoardSide>(), Ok(BoardSide::Front));
        assert_eq!("back".parse::<BoardSide>(), Ok(BoardSide::Back));
        assert!("top".parse::<BoardSide>().is_err());
    }

    #[test]
    fn capture_requires_pads_unless_allowed() {
        let key = ReferenceKey::new("A1", BoardSide::Front).expect("key");
        assert_eq!(
            capture_reference(&key, None, Vec::new(), false),
            Err(ValidationError::NoPadsDetected)
        );
        let empty = capture_reference(&key, None, Vec::new(), true).expect("allowed");
        assert!(empty.pads.is_empty());
    }

    #[test]
    fn capture_keeps_serial_side_and_geometry() {
        let key = ReferenceKey::new("my_board-7", BoardSide::Back).expect("key");
        let before = Utc::now();
        let record = capture_reference(
            &key,
            Some("frames/ref.png".to_string()),
            vec![candidate(0.2, 0.2)],
            false,
        )
        .expect("capture");
        assert_eq!(record.serial, "MY_BOARD-7");
        assert_eq!(record.side, BoardSide::Back);
        assert!(record.timestamp >= before);
        assert_eq!(record.pads[0].area, Some(1600));
        assert_eq!(record.pads[0].name, None);
    }

    #[test]
    fn record_json_uses_stored_field_names() {
        let key = ReferenceKey::new("A1", BoardSide::Front).expect("key");
        let record =
            capture_reference(&key, Some("a.png".into()), vec![candidate(0.2, 0.2)], false)
                .expect("capture");
        let json = serde_json::to_value(&record).expect("json");
        assert_eq!(json["key"], "A1_front");
        assert_eq!(json["side"], "front");
        assert_eq!(json["imageData"], "a.png");
        assert_eq!(json["padPositions"][0]["boundingBox"]["width"], 40);
        assert!(json["padPositions"][0].get("name").is_none());

        let back: ReferenceRecord = serde_json::from_value(json).expect("parse");
        assert_eq!(back, record);
    }
}
