use ouramind_core::error::CoreError;

/// Error type for pipeline operations.
///
/// Wraps [`CoreError`] for domain failures and [`sqlx::Error`] for storage
/// failures.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Core(CoreError::NotFound { .. }))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Core(CoreError::Validation(_)))
    }

    /// Any classifier failure, including timeouts and malformed responses.
    pub fn is_classification_failed(&self) -> bool {
        matches!(self, Self::Core(CoreError::Classification(_)))
    }

    pub fn is_cipher(&self) -> bool {
        matches!(self, Self::Core(CoreError::Cipher(_)))
    }

    /// A unique or check constraint rejected the write.
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::Database(db_err)) => {
                matches!(db_err.code().as_deref(), Some("23505"))
            }
            _ => false,
        }
    }
}

/// Shorthand for a [`CoreError::NotFound`] wrapped as a pipeline error.
pub(crate) fn not_found(entity: &'static str, id: impl std::fmt::Display) -> PipelineError {
    PipelineError::Core(CoreError::not_found(entity, id))
}

/// Shorthand for a [`CoreError::Validation`] wrapped as a pipeline error.
pub(crate) fn invalid(message: impl Into<String>) -> PipelineError {
    PipelineError::Core(CoreError::Validation(message.into()))
}
