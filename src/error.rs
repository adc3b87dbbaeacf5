use thiserror::Error;

/// Why a run could not be saved. The live timers are never touched by a
/// failed save, so the caller can simply try again.
#[derive(Debug, Error)]
pub enum SaveRunError {
    #[error("run title must not be empty")]
    EmptyTitle,
    #[error("failed to persist run: {0:#}")]
    Persistence(#[source] anyhow::Error),
}
