use std::fmt::Display;

use crate::cipher::CipherError;
use crate::classifier::ClassifierError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Entity is absent or not owned by the caller. Ownership mismatches are
    /// reported through this variant as well.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Classification(#[from] ClassifierError),
}

impl CoreError {
    /// Build a [`CoreError::NotFound`] for any displayable key.
    pub fn not_found(entity: &'static str, id: impl Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
