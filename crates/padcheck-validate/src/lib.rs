//! Validation of detected gap pads.
//!
//! - [`score_reference_match`]: how many stored reference pads have a
//!   detection within the per-axis tolerance, graded success/warning/fail.
//! - [`validate_against_template`]: checks the detected count against a
//!   product template's required pads before grading placement.
//! - [`ValidationSession`] and [`Watcher`]: continuous validation of one
//!   reference on a fixed poll period.
//!
//! References are keyed by normalized serial and board side
//! ([`ReferenceKey`]) and stored through the [`ReferenceStore`] trait;
//! [`ReferenceLibrary`] is the JSON-file implementation.

mod error;
pub mod matching;
mod reference;
mod scoring;
mod session;
mod store;
mod template;
mod watch;

pub use error::{StoreIoError, ValidationError};
pub use matching::{PadPosition, PositionTolerance};
pub use reference::{
    capture_reference, BoardSide, ParseBoardSideError, ReferenceKey, ReferencePad,
    ReferenceRecord,
};
pub use scoring::{
    score_reference_match, validate_against_template, ValidationParams, ValidationResult,
    ValidationStatus,
};
pub use session::{SessionState, TickTicket, ValidationSession};
pub use store::{ReferenceLibrary, ReferenceStore};
pub use template::{
    ProductTemplates, TemplateLayout, TemplateLibrary, TemplatePad, TemplateSummary,
    MANUAL_PAD_SIZE, MANUAL_SNAP_RADIUS,
};
pub use watch::{FrameSource, WatchOptions, WatchSummary, Watcher};
