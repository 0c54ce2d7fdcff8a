use thiserror::Error;
use vcat_adapter::AdapterError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl CatalogError {
    /// See [`AdapterError::is_retry_safe`].
    pub fn is_retry_safe(&self) -> bool {
        match self {
            Self::Adapter(e) => e.is_retry_safe(),
            Self::InvalidOperation(_) => true,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Adapter(e) if e.is_conflict())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
