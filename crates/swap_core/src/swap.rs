use serde::{Deserialize, Serialize};

use crate::balance::{compute_balance_changes, AssetId};
use crate::classify::{classify, legs_for_wallet, TradeType};
use crate::pool::resolve_pool_id;
use crate::snapshot::TransactionSnapshot;

/// Everything extracted from a swap transaction except its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapDetails {
    pub amount_in: f64,
    pub amount_out: f64,
    pub asset_in: AssetId,
    pub asset_out: AssetId,
    pub decimals_in: u8,
    pub direction: TradeType,
    pub pool_id: String,
    /// Base58 pubkey of the first signer, empty if none is flagged
    pub signer: String,
}

/// Parsed swap, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Swap {
    pub signature: String,
    /// Block time in milliseconds (0 when the node reports none)
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
    /// Input asset: `"SOL"` for the native asset, otherwise the mint
    pub token_mint: String,
    pub token_decimals: u8,
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    pub amount_in: f64,
    pub amount_out: f64,
    pub pool_id: String,
    pub signer: String,
}

/// Run extraction, classification and pool resolution over a snapshot.
///
/// `None` means the transaction is not a swap of `program_id` with a native
/// leg and a resolvable pool.
pub fn extract_swap_details(snapshot: &TransactionSnapshot, program_id: &str) -> Option<SwapDetails> {
    let changes = compute_balance_changes(snapshot);
    let signer = snapshot.signer().unwrap_or_default();

    let legs = if signer.is_empty() {
        classify(&changes)?
    } else {
        classify(&legs_for_wallet(&changes, signer))?
    };

    let pool_id = resolve_pool_id(snapshot, program_id)?;

    Some(SwapDetails {
        amount_in: legs.amount_in,
        amount_out: legs.amount_out,
        asset_in: legs.asset_in,
        asset_out: legs.asset_out,
        decimals_in: legs.decimals_in,
        direction: legs.direction,
        pool_id,
        signer: signer.to_string(),
    })
}

/// Build the final swap record.
pub fn assemble(signature: &str, snapshot: &TransactionSnapshot, details: SwapDetails) -> Swap {
    Swap {
        signature: signature.to_string(),
        timestamp_ms: snapshot.timestamp_ms(),
        token_mint: details.asset_in.to_string(),
        token_decimals: details.decimals_in,
        trade_type: details.direction,
        amount_in: details.amount_in,
        amount_out: details.amount_out,
        pool_id: details.pool_id,
        signer: details.signer,
    }
}
