use crate::reference::ReferenceKey;

/// Errors reported by reference handling and validation sessions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no reference found for {0}")]
    NoReferenceFound(ReferenceKey),
    #[error("reference holds no pad positions")]
    EmptyReferencePads,
    #[error("serial number is empty")]
    InvalidSerial,
    #[error("no pads detected; capture with `allow_empty` to store an empty reference")]
    NoPadsDetected,
    #[error("validation session is idle")]
    SessionIdle,
    #[error("a validation tick is already in progress")]
    TickInProgress,
}

/// Reading or writing a JSON reference/template library failed.
#[derive(thiserror::Error, Debug)]
pub enum StoreIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
