use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NeighborhoodError {
    /// Raised from inside a traversal after [`crate::CancelToken::cancel`].
    #[error("neighborhood computation was cancelled")]
    Cancelled,

    #[error("neighborhood distance must be at least 1, got {0}")]
    InvalidDistance(u32),
}
