use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Not found: {0}")]
    NotFound(uuid::Uuid),

    #[error("Interval shorter than the minimum clip length")]
    DegenerateInterval,

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Overlap detected")]
    OverlapDetected,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

impl CoreError {
    /// Unknown ids are expected when the UI races a deletion; callers
    /// usually ignore these.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
