//! Per-product expected pad layouts.
//!
//! The library JSON is keyed by product type, then by variant:
//!
//! ```json
//! { "3U": { "width": 160, "height": 100, "thickness": 25.4,
//!           "variants": { "3U-Basic": { "name": "3U Basic", "description": "",
//!                                       "expectedPads": 4, "padLayout": [] } } } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use nalgebra::{distance, Point2};
use serde::{Deserialize, Serialize};

use crate::error::StoreIoError;
use crate::reference::ReferencePad;

/// Manual clicks farther than this from every template pad are ignored.
pub const MANUAL_SNAP_RADIUS: f32 = 0.1;
/// Normalized size given to manually taught pads.
pub const MANUAL_PAD_SIZE: f32 = 0.1;

/// Expected pad geometry in frame fractions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplatePad {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub required: bool,
    pub name: String,
    /// Overlay hint only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateLayout {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub expected_pads: usize,
    pub pad_layout: Vec<TemplatePad>,
}

impl TemplateLayout {
    /// Pad count used by template-aware scoring; optional pads are not counted.
    pub fn required_pad_count(&self) -> usize {
        self.pad_layout.iter().filter(|p| p.required).count()
    }

    /// Turn a manual click at `(x, y)` into a reference pad named after the
    /// nearest template pad, or `None` when no template pad is close enough.
    pub fn snap_manual_pad(&self, x: f32, y: f32, seq: usize) -> Option<ReferencePad> {
        let click = Point2::new(x, y);
        let (nearest, dist) = self
            .pad_layout
            .iter()
            .map(|pad| (pad, distance(&click, &Point2::new(pad.x, pad.y))))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        if dist >= MANUAL_SNAP_RADIUS {
            return None;
        }

        Some(ReferencePad {
            x,
            y,
            width: MANUAL_PAD_SIZE,
            height: MANUAL_PAD_SIZE,
            confidence: 1.0,
            id: format!("manual_{seq}"),
            area: None,
            aspect_ratio: None,
            bounding_box: None,
            name: Some(nearest.name.clone()),
            required: Some(nearest.required),
        })
    }
}

/// All variants of one product type, with its physical size in millimeters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductTemplates {
    #[serde(rename = "width")]
    pub width_mm: f32,
    #[serde(rename = "height")]
    pub height_mm: f32,
    #[serde(rename = "thickness")]
    pub thickness_mm: f32,
    pub variants: BTreeMap<String, TemplateLayout>,
}

/// One row of [`TemplateLibrary::list`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub product: String,
    pub variant: String,
    pub name: String,
    pub expected_pads: usize,
    pub required_pads: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateLibrary {
    products: BTreeMap<String, ProductTemplates>,
}

impl TemplateLibrary {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, StoreIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), StoreIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn insert(&mut self, product: impl Into<String>, templates: ProductTemplates) {
        self.products.insert(product.into(), templates);
    }

    pub fn product(&self, product: &str) -> Option<&ProductTemplates> {
        self.products.get(product)
    }

    pub fn get(&self, product: &str, variant: &str) -> Option<&TemplateLayout> {
        self.products.get(product)?.variants.get(variant)
    }

    /// Every variant, ordered by product then variant key.
    pub fn list(&self) -> Vec<TemplateSummary> {
        self.products
            .iter()
            .flat_map(|(product, templates)| {
                templates
                    .variants
                    .iter()
                    .map(move |(variant, layout)| TemplateSummary {
                        product: product.clone(),
                        variant: variant.clone(),
                        name: layout.name.clone(),
                        expected_pads: layout.expected_pads,
                        required_pads: layout.required_pad_count(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r##"{
        "3U": {
            "width": 160, "height": 100, "thickness": 25.4,
            "variants": {
                "3U-HighPower": {
                    "name": "3U High Power",
                    "description": "enhanced thermal management",
                    "expectedPads": 3,
                    "padLayout": [
                        { "x": 0.15, "y": 0.15, "width": 0.12, "height": 0.12, "required": true, "name": "CPU", "color": "#ff6600" },
                        { "x": 0.5, "y": 0.5, "width": 0.12, "height": 0.12, "required": true, "name": "Chipset" },
                        { "x": 0.5, "y": 0.8, "width": 0.12, "height": 0.12, "required": false, "name": "Optional" }
                    ]
                }
            }
        }
    }"##;

    fn library() -> TemplateLibrary {
        serde_json::from_str(LIBRARY).expect("parse library")
    }

    #[test]
    fn optional_pads_are_not_required() {
        let lib = library();
        let layout = lib.get("3U", "3U-HighPower").expect("variant");
        assert_eq!(layout.expected_pads, 3);
        assert_eq!(layout.required_pad_count(), 2);
        assert!(lib.get("3U", "missing").is_none());
        assert!(lib.get("6U", "3U-HighPower").is_none());
        assert_eq!(lib.product("3U").map(|p| p.width_mm), Some(160.0));
    }

    #[test]
    fn list_summarizes_variants() {
        let list = library().list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].product, "3U");
        assert_eq!(list[0].variant, "3U-HighPower");
        assert_eq!(list[0].required_pads, 2);
    }

    #[test]
    fn manual_click_snaps_to_nearest_pad() {
        let lib = library();
        let layout = lib.get("3U", "3U-HighPower").expect("variant");

        let pad = layout.snap_manual_pad(0.52, 0.75, 7).expect("near optional pad");
        assert_eq!(pad.name.as_deref(), Some("Optional"));
        assert_eq!(pad.required, Some(false));
        assert_eq!((pad.x, pad.y), (0.52, 0.75));
        assert_eq!((pad.width, pad.height, pad.confidence), (0.1, 0.1, 1.0));
        assert_eq!(pad.id, "manual_7");

        assert!(layout.snap_manual_pad(0.95, 0.05, 8).is_none());
    }

    #[test]
    fn json_round_trip_keeps_field_names() {
        let json = serde_json::to_value(library()).expect("json");
        let variant = &json["3U"]["variants"]["3U-HighPower"];
        assert_eq!(variant["expectedPads"], 3);
        assert!(variant["padLayout"][1].get("color").is_none());
    }
}
