//! Error types for the retrieval layer.

use medaid_core::error::MedaidError;

/// Errors from the collection store and embedding services.
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    #[error("collection already exists: {0}")]
    CollectionExists(String),
    #[error("collection not found: {0}")]
    CollectionNotFound(String),
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("store lock poisoned: {0}")]
    Lock(String),
}

impl VectorError {
    /// True for the "collection absent" case, as opposed to a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VectorError::CollectionNotFound(_))
    }
}

impl From<VectorError> for MedaidError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::CollectionNotFound(name) => MedaidError::NotFound(name),
            VectorError::Embedding(msg) => MedaidError::Embedding(msg),
            other => MedaidError::Retrieval(other.to_string()),
        }
    }
}
