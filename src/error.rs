use thiserror::Error;

/// Rejections raised when a reading session is created. No session state is
/// touched when one of these is returned.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("text exceeds limit of {limit} characters ({len} given)")]
    TextTooLong { len: usize, limit: usize },
    #[error("please enter some text")]
    EmptyText,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("speech capture is not available on this platform")]
    Unavailable,
    #[error("speech capture failed to start: {0}")]
    Failed(String),
}
