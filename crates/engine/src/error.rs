use signoff_core::error::CoreError;

/// Error type for engine transitions.
///
/// Any error returned mid-transition drops the open transaction, rolling
/// back every mutation of that transition.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
