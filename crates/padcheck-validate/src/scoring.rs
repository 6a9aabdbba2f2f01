//! Reference and template-aware scoring.

use padcheck_detect::PadCandidate;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::ValidationError;
use crate::matching::{PadPosition, PositionTolerance};
use crate::template::TemplateLayout;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Success,
    Warning,
    Fail,
}

impl ValidationStatus {
    /// Classify a match percentage against the configured thresholds.
    pub fn from_percentage(percentage: f64, params: &ValidationParams) -> Self {
        if percentage >= params.success_percent {
            ValidationStatus::Success
        } else if percentage >= params.warning_percent {
            ValidationStatus::Warning
        } else {
            ValidationStatus::Fail
        }
    }

    pub fn is_fail(self) -> bool {
        self == ValidationStatus::Fail
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ValidationStatus::Success => "success",
            ValidationStatus::Warning => "warning",
            ValidationStatus::Fail => "fail",
        })
    }
}

fn default_tolerance() -> f32 {
    0.05
}

fn default_success_percent() -> f64 {
    90.0
}

fn default_warning_percent() -> f64 {
    70.0
}

fn default_poll_period_ms() -> u64 {
    2000
}

/// Scoring thresholds and the continuous-validation poll period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationParams {
    /// Per-axis position tolerance in frame fractions.
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,
    #[serde(default = "default_success_percent")]
    pub success_percent: f64,
    #[serde(default = "default_warning_percent")]
    pub warning_percent: f64,
    #[serde(default = "default_poll_period_ms")]
    pub poll_period_ms: u64,
}

impl Default for ValidationParams {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            success_percent: default_success_percent(),
            warning_percent: default_warning_percent(),
            poll_period_ms: default_poll_period_ms(),
        }
    }
}

impl ValidationParams {
    #[inline]
    pub fn position_tolerance(&self) -> PositionTolerance {
        PositionTolerance(self.tolerance)
    }

    pub fn poll_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_period_ms)
    }
}

/// Verdict of one scoring run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub status: ValidationStatus,
    pub matched_count: usize,
    /// Number of reference pads.
    pub total_count: usize,
    pub match_percentage: f64,
    pub detected_count: usize,
    /// Placement accuracy, set when a template-aware run reached the placement check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<usize>,
    pub message: String,
}

fn percentage(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64 * 100.0
    }
}

/// Score a detection against the stored reference pads.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(reference = reference.len(), detected = detected.len()))
)]
pub fn score_reference_match<R: PadPosition>(
    reference: &[R],
    detected: &[PadCandidate],
    params: &ValidationParams,
) -> ValidationResult {
    let matched = params
        .position_tolerance()
        .count_matched(reference, detected);
    let total = reference.len();
    let pct = percentage(matched, total);
    let status = ValidationStatus::from_percentage(pct, params);
    let message = match status {
        ValidationStatus::Success => format!("{matched}/{total} pads correctly placed"),
        ValidationStatus::Warning => format!(
            "{matched}/{total} pads match the reference ({} detected)",
            detected.len()
        ),
        ValidationStatus::Fail => format!("only {matched}/{total} pads match the reference"),
    };
    log::debug!("reference match: {matched}/{total} ({pct:.1}%) -> {status}");

    ValidationResult {
        status,
        matched_count: matched,
        total_count: total,
        match_percentage: pct,
        detected_count: detected.len(),
        accuracy: None,
        missing: None,
        extra: None,
        message,
    }
}

/// Score a detection against a template's required pad count, then against
/// the reference placement.
///
/// `matched_count` and `match_percentage` are always filled in; the pad count
/// check decides the status before placement is considered.
pub fn validate_against_template<R: PadPosition>(
    template: &TemplateLayout,
    reference: &[R],
    detected: &[PadCandidate],
    params: &ValidationParams,
) -> Result<ValidationResult, ValidationError> {
    if reference.is_empty() {
        return Err(ValidationError::EmptyReferencePads);
    }

    let expected = template.required_pad_count();
    let found = detected.len();
    let mut result = score_reference_match(reference, detected, params);

    if found < expected {
        result.status = ValidationStatus::Fail;
        result.missing = Some(expected - found);
        result.message = format!("missing pads: found {found}, expected {expected}");
    } else if found > expected {
        result.status = ValidationStatus::Warning;
        result.extra = Some(found - expected);
        result.message = format!("extra pads detected: found {found}, expected {expected}");
    } else {
        let accuracy = result.match_percentage;
        result.accuracy = Some(accuracy);
        result.message = match result.status {
            ValidationStatus::Success => {
                format!("all pads correctly placed, accuracy {accuracy:.1}%")
            }
            ValidationStatus::Warning => format!(
                "placement issues: {}/{} correct",
                result.matched_count, result.total_count
            ),
            ValidationStatus::Fail => format!(
                "poor placement accuracy: {}/{} correct",
                result.matched_count, result.total_count
            ),
        };
    }
    log::debug!(
        "template '{}': {} -> {}",
        template.name,
        result.message,
        result.status
    );
    Ok(result)
}
