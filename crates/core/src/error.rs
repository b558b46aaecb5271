use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unsupported hash algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
