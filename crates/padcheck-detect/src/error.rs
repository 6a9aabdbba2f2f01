use padcheck_core::FrameError;

/// Failure inside one detection stage.
///
/// Never returned by [`crate::PadDetector::detect`]; the pipeline turns it
/// into a fallback attempt or an empty result.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectError {
    #[error(transparent)]
    Frame(#[from] FrameError),
}
