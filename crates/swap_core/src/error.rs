use thiserror::Error;

/// Failures of a swap or balance lookup.
///
/// "Not a qualifying swap" is not an error; parsers return `Ok(None)` for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The signature does not resolve to any transaction.
    #[error("transaction not found: {0}")]
    NotFound(String),

    /// The transaction exists but carries no balance metadata.
    #[error("transaction metadata not available: {0}")]
    MetadataUnavailable(String),

    /// Transport, RPC, HTTP or address-decoding failure, with the underlying message.
    #[error("{0}")]
    Upstream(String),
}

impl LookupError {
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        LookupError::Upstream(err.to_string())
    }
}
