//! Swap classification from balance changes.
//!
//! Leg policy: among outflows the change with the largest absolute decimal
//! amount is the input leg, among inflows the largest is the output leg.
//! Ties keep the earliest change in list order. Extra legs (router hops,
//! fee transfers) are dropped, not decomposed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::balance::{AssetId, BalanceChange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    /// Token in, native asset out
    Buy,
    /// Native asset in, token out
    Sell,
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeType::Buy => f.write_str("BUY"),
            TradeType::Sell => f.write_str("SELL"),
        }
    }
}

/// The two legs of a classified swap.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapLegs {
    /// Positive amount of `asset_in` that left
    pub amount_in: f64,
    /// Positive amount of `asset_out` that arrived
    pub amount_out: f64,
    pub asset_in: AssetId,
    pub asset_out: AssetId,
    pub decimals_in: u8,
    pub direction: TradeType,
}

/// Pick the input and output legs and classify the direction.
///
/// Returns `None` when either leg is missing or neither leg is the native
/// asset.
pub fn classify(changes: &[BalanceChange]) -> Option<SwapLegs> {
    let input = dominant(changes.iter().filter(|c| c.is_outflow()))?;
    let output = dominant(changes.iter().filter(|c| c.is_inflow()))?;

    let direction = if input.asset.is_native() {
        TradeType::Sell
    } else if output.asset.is_native() {
        TradeType::Buy
    } else {
        return None;
    };

    Some(SwapLegs {
        amount_in: input.amount.abs(),
        amount_out: output.amount,
        asset_in: input.asset.clone(),
        asset_out: output.asset.clone(),
        decimals_in: input.decimals,
        direction,
    })
}

/// Narrow `changes` to the legs owned by `wallet` when those alone form a
/// swap (at least one outflow and one inflow); otherwise keep everything.
pub fn legs_for_wallet(changes: &[BalanceChange], wallet: &str) -> Vec<BalanceChange> {
    let owned: Vec<BalanceChange> = changes
        .iter()
        .filter(|c| c.owner.as_deref() == Some(wallet))
        .cloned()
        .collect();

    let has_out = owned.iter().any(|c| c.is_outflow());
    let has_in = owned.iter().any(|c| c.is_inflow());

    if has_out && has_in {
        owned
    } else {
        changes.to_vec()
    }
}

fn dominant<'a>(legs: impl Iterator<Item = &'a BalanceChange>) -> Option<&'a BalanceChange> {
    legs.fold(None, |best: Option<&BalanceChange>, c| match best {
        Some(b) if b.amount.abs() >= c.amount.abs() => Some(b),
        _ => Some(c),
    })
}
