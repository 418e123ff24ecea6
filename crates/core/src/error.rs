//! Error types for simward core services.

/// Errors surfaced by the persistence seam.
///
/// The in-memory adapter never fails, but the trait signature carries this
/// error so that a relational adapter can report connection and query
/// failures without changing any call site.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Errors surfaced by core services.
///
/// Route handlers map these onto HTTP statuses: `InvalidInput` is a 400,
/// `Unauthenticated` a 401, `Forbidden` a 403, `NotFound` a 404, and
/// `Store` a logged, generic 500.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result alias for core service operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
