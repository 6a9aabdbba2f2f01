//! Gap pad placement inspection.
//!
//! This crate provides:
//! - re-exports of the workspace crates (`core`, `detect` pipeline, `validate`),
//! - [`PadcheckConfig`], the JSON configuration used by the CLI,
//! - (feature `image`) helpers that decode image files and run the detector,
//!   plus a directory-backed frame source for continuous validation.
//!
//! ## Quickstart
//!
//! ```no_run
//! use padcheck::detect::detect_pads_in_file;
//! use padcheck::{score_reference_match, PadDetector, ValidationParams};
//!
//! let detector = PadDetector::default();
//! let golden = detect_pads_in_file("golden.png", &detector).candidates;
//! let live = detect_pads_in_file("live.png", &detector).candidates;
//!
//! let verdict = score_reference_match(&golden, &live, &ValidationParams::default());
//! println!("{}: {}", verdict.status, verdict.message);
//! ```
//!
//! ## API map
//! - `padcheck::core`: frames, masks, bounding boxes, logger.
//! - `padcheck::pipeline`: segmentation, morphology, components, RGB fallback.
//! - `padcheck::validate`: scoring, references, templates, validation sessions.
//! - `padcheck::detect` (feature `image`): end-to-end helpers over image files.

pub use padcheck_core as core;
pub use padcheck_detect as pipeline;
pub use padcheck_validate as validate;

pub use padcheck_core::{RgbaImage, RgbaImageView};
pub use padcheck_detect::{
    DetectionPath, FallbackReason, PadCandidate, PadDetection, PadDetector, PadDetectorParams,
};
pub use padcheck_validate::{
    capture_reference, score_reference_match, validate_against_template, BoardSide,
    ReferenceKey, ReferenceLibrary, ReferenceRecord, ReferenceStore, TemplateLibrary,
    ValidationError, ValidationParams, ValidationResult, ValidationSession, ValidationStatus,
};

mod config;

pub use config::{ConfigIoError, PadcheckConfig};

#[cfg(feature = "image")]
pub mod detect;
