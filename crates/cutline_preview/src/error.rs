use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Failed to start mpv: {0}")]
    MpvSpawn(String),

    #[error("mpv IPC error: {0}")]
    MpvIpc(String),

    #[error("Timeline store is unavailable (lock poisoned)")]
    StoreUnavailable,

    #[error("Ticker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PreviewError>;
