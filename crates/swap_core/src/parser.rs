//! Top-level swap parsing over an abstract transaction source.

use async_trait::async_trait;
use log::debug;

use crate::error::LookupError;
use crate::pool::RAYDIUM_ROUTE_PROGRAM_ID;
use crate::snapshot::TransactionSnapshot;
use crate::swap::{assemble, extract_swap_details, Swap};

/// Where transactions come from (an RPC node in production).
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetch a confirmed transaction. `Ok(None)` when the signature is unknown.
    async fn fetch_transaction(&self, signature: &str) -> Result<Option<TransactionSnapshot>, LookupError>;
}

/// Parses swaps of one program from transactions fetched by signature.
///
/// Holds no cache: every call re-fetches and re-parses.
pub struct SwapParser<S> {
    source: S,
    program_id: String,
}

impl<S: TransactionSource> SwapParser<S> {
    pub fn new(source: S, program_id: impl Into<String>) -> Self {
        Self {
            source,
            program_id: program_id.into(),
        }
    }

    /// Parser for the Raydium route program.
    pub fn raydium(source: S) -> Self {
        Self::new(source, RAYDIUM_ROUTE_PROGRAM_ID)
    }

    pub fn program_id(&self) -> &str {
        &self.program_id
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch and parse `signature`.
    ///
    /// Errors with `NotFound` for unknown signatures and `MetadataUnavailable`
    /// when the node returns no status metadata. `Ok(None)` means the
    /// transaction is valid but not a recognized swap.
    pub async fn parse_swap_transaction(&self, signature: &str) -> Result<Option<Swap>, LookupError> {
        let snapshot = self
            .source
            .fetch_transaction(signature)
            .await?
            .ok_or_else(|| LookupError::NotFound(signature.to_string()))?;

        parse_snapshot(signature, &snapshot, &self.program_id)
    }
}

/// Parse an already fetched transaction.
pub fn parse_snapshot(
    signature: &str,
    snapshot: &TransactionSnapshot,
    program_id: &str,
) -> Result<Option<Swap>, LookupError> {
    if snapshot.meta.is_none() {
        return Err(LookupError::MetadataUnavailable(signature.to_string()));
    }

    if !snapshot.has_program(program_id) {
        debug!("sig={signature} does not invoke {program_id}");
        return Ok(None);
    }

    let Some(details) = extract_swap_details(snapshot, program_id) else {
        debug!("sig={signature} has no native leg or no pool reference");
        return Ok(None);
    };

    Ok(Some(assemble(signature, snapshot, details)))
}
