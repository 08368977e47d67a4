//! Balance-delta extraction.
//!
//! Builds a before/after balance map keyed by account index from the
//! transaction metadata and emits one [`BalanceChange`] per index present on
//! both sides. Token balances take precedence over native balances for the
//! same index. Deltas are computed on raw integers; the decimal amount is
//! derived once from the raw delta.

use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::snapshot::{TokenBalance, TransactionSnapshot};

/// Decimals of the native asset (lamports per SOL = 10^9)
pub const NATIVE_DECIMALS: u8 = 9;

/// Display form of the native asset marker
pub const NATIVE_SYMBOL: &str = "SOL";

/// Asset a balance is denominated in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum AssetId {
    /// Plain lamport balance of an account
    Native,
    /// SPL token mint address
    Mint(String),
}

impl AssetId {
    pub fn is_native(&self) -> bool {
        matches!(self, AssetId::Native)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Native => f.write_str(NATIVE_SYMBOL),
            AssetId::Mint(mint) => f.write_str(mint),
        }
    }
}

/// Balance of one account at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceState {
    Native(u64),
    Token {
        mint: String,
        owner: Option<String>,
        amount: u128,
        decimals: u8,
    },
}

/// Signed change of one account across the transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceChange {
    pub account_index: usize,
    pub asset: AssetId,
    /// Wallet the balance belongs to: the account itself for native
    /// balances, the token account owner for token balances.
    pub owner: Option<String>,
    /// post - pre, in base units
    pub raw_change: i128,
    pub decimals: u8,
    /// `raw_change / 10^decimals`
    pub amount: f64,
}

impl BalanceChange {
    pub fn new(
        account_index: usize,
        asset: AssetId,
        owner: Option<String>,
        raw_change: i128,
        decimals: u8,
    ) -> Self {
        Self {
            account_index,
            asset,
            owner,
            raw_change,
            decimals,
            amount: to_decimal(raw_change, decimals),
        }
    }

    pub fn is_outflow(&self) -> bool {
        self.raw_change < 0
    }

    pub fn is_inflow(&self) -> bool {
        self.raw_change > 0
    }
}

/// Scale a raw base-unit amount down by `10^decimals`.
pub fn to_decimal(raw: i128, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(i32::from(decimals))
}

/// Compute per-account balance changes for a transaction.
///
/// Returns an empty list when the snapshot carries no metadata.
pub fn compute_balance_changes(snapshot: &TransactionSnapshot) -> Vec<BalanceChange> {
    let Some(meta) = snapshot.meta.as_ref() else {
        return Vec::new();
    };

    let pre = build_balance_map(
        meta.pre_token_balances.as_deref().unwrap_or_default(),
        &meta.pre_balances,
    );
    let post = build_balance_map(
        meta.post_token_balances.as_deref().unwrap_or_default(),
        &meta.post_balances,
    );

    let mut changes = Vec::new();

    for (&index, before) in &pre {
        let Some(after) = post.get(&index) else {
            continue;
        };

        match (before, after) {
            (BalanceState::Native(pre_lamports), BalanceState::Native(post_lamports)) => {
                let delta = i128::from(*post_lamports) - i128::from(*pre_lamports);
                let owner = snapshot.account_key(index).map(str::to_string);
                changes.push(BalanceChange::new(index, AssetId::Native, owner, delta, NATIVE_DECIMALS));
            }
            (
                BalanceState::Token {
                    mint: pre_mint,
                    owner: pre_owner,
                    amount: pre_amount,
                    decimals: pre_decimals,
                },
                BalanceState::Token {
                    mint: post_mint,
                    owner: post_owner,
                    amount: post_amount,
                    decimals: post_decimals,
                },
            ) => {
                if pre_mint != post_mint {
                    debug!("account {index}: mint changed {pre_mint} -> {post_mint}, skipped");
                    continue;
                }
                if pre_decimals != post_decimals {
                    debug!("account {index}: decimals changed {pre_decimals} -> {post_decimals}, skipped");
                    continue;
                }

                let Some(delta) = signed_delta(*pre_amount, *post_amount) else {
                    debug!("account {index}: token delta out of range, skipped");
                    continue;
                };

                let owner = post_owner.clone().or_else(|| pre_owner.clone());
                changes.push(BalanceChange::new(
                    index,
                    AssetId::Mint(post_mint.clone()),
                    owner,
                    delta,
                    *post_decimals,
                ));
            }
            _ => {
                debug!("account {index}: native/token mismatch between pre and post, skipped");
            }
        }
    }

    changes
}

/// Merge token balances over native balances for one side of the transaction.
fn build_balance_map(token_balances: &[TokenBalance], native: &[u64]) -> BTreeMap<usize, BalanceState> {
    let mut map = BTreeMap::new();

    for tb in token_balances {
        let amount = match tb.ui_token_amount.amount.parse::<u128>() {
            Ok(a) => a,
            Err(e) => {
                debug!(
                    "account {}: unparseable token amount {:?}: {e}",
                    tb.account_index, tb.ui_token_amount.amount
                );
                continue;
            }
        };

        map.insert(
            tb.account_index as usize,
            BalanceState::Token {
                mint: tb.mint.clone(),
                owner: tb.owner.clone(),
                amount,
                decimals: tb.ui_token_amount.decimals,
            },
        );
    }

    for (index, lamports) in native.iter().enumerate() {
        map.entry(index).or_insert(BalanceState::Native(*lamports));
    }

    map
}

fn signed_delta(pre: u128, post: u128) -> Option<i128> {
    let pre = i128::try_from(pre).ok()?;
    let post = i128::try_from(post).ok()?;
    post.checked_sub(pre)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn snapshot_from(meta: Value) -> TransactionSnapshot {
        TransactionSnapshot::from_json(&json!({
            "blockTime": 1734643200,
            "meta": meta,
            "transaction": {
                "signatures": ["test_sig"],
                "message": {
                    "accountKeys": [
                        { "pubkey": "Trader111", "signer": true, "writable": true },
                        { "pubkey": "TraderTokenAcc111", "signer": false, "writable": true },
                        { "pubkey": "PoolVault111", "signer": false, "writable": true }
                    ],
                    "instructions": []
                }
            }
        }))
        .unwrap()
    }

    fn changes_for(meta: Value) -> Vec<BalanceChange> {
        compute_balance_changes(&snapshot_from(meta))
    }

    #[test]
    fn test_native_and_token_changes() {
        let changes = changes_for(json!({
            "preBalances": [2000000000u64, 2039280, 2039280],
            "postBalances": [1000000000u64, 2039280, 2039280],
            "preTokenBalances": [
                {
                    "accountIndex": 1,
                    "mint": "MINTX",
                    "owner": "Trader111",
                    "uiTokenAmount": { "amount": "0", "decimals": 6, "uiAmount": null }
                }
            ],
            "postTokenBalances": [
                {
                    "accountIndex": 1,
                    "mint": "MINTX",
                    "owner": "Trader111",
                    "uiTokenAmount": { "amount": "1000000", "decimals": 6, "uiAmount": 1.0 }
                }
            ]
        }));

        assert_eq!(changes.len(), 3);

        let native = &changes[0];
        assert_eq!(native.account_index, 0);
        assert_eq!(native.asset, AssetId::Native);
        assert_eq!(native.owner.as_deref(), Some("Trader111"));
        assert_eq!(native.raw_change, -1_000_000_000);
        assert_eq!(native.decimals, 9);
        assert_eq!(native.amount, -1.0);

        let token = &changes[1];
        assert_eq!(token.asset, AssetId::Mint("MINTX".into()));
        assert_eq!(token.owner.as_deref(), Some("Trader111"));
        assert_eq!(token.raw_change, 1_000_000);
        assert_eq!(token.decimals, 6);
        assert_eq!(token.amount, 1.0);

        // Unchanged accounts are still reported
        assert_eq!(changes[2].raw_change, 0);
        assert_eq!(changes[2].owner.as_deref(), Some("PoolVault111"));
    }

    #[test]
    fn test_token_amounts_are_exact_integers() {
        // Above 2^53 a float parse of either side would lose the last digit
        let changes = changes_for(json!({
            "preBalances": [0, 0, 0],
            "postBalances": [0, 0, 0],
            "preTokenBalances": [
                {
                    "accountIndex": 2,
                    "mint": "BigMint",
                    "uiTokenAmount": { "amount": "18014398509481985", "decimals": 0 }
                }
            ],
            "postTokenBalances": [
                {
                    "accountIndex": 2,
                    "mint": "BigMint",
                    "uiTokenAmount": { "amount": "18014398509481988", "decimals": 0 }
                }
            ]
        }));

        let token = changes.iter().find(|c| c.account_index == 2).unwrap();
        assert_eq!(token.raw_change, 3);
        assert_eq!(token.amount, 3.0);
    }

    #[test]
    fn test_mint_mismatch_skipped() {
        let changes = changes_for(json!({
            "preBalances": [10, 20, 30],
            "postBalances": [10, 20, 30],
            "preTokenBalances": [
                { "accountIndex": 1, "mint": "MintA", "uiTokenAmount": { "amount": "5", "decimals": 0 } }
            ],
            "postTokenBalances": [
                { "accountIndex": 1, "mint": "MintB", "uiTokenAmount": { "amount": "7", "decimals": 0 } }
            ]
        }));

        assert!(changes.iter().all(|c| c.account_index != 1));
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn test_decimals_mismatch_skipped() {
        let changes = changes_for(json!({
            "preBalances": [10, 20, 30],
            "postBalances": [10, 20, 30],
            "preTokenBalances": [
                { "accountIndex": 1, "mint": "MintA", "uiTokenAmount": { "amount": "5", "decimals": 6 } }
            ],
            "postTokenBalances": [
                { "accountIndex": 1, "mint": "MintA", "uiTokenAmount": { "amount": "7", "decimals": 9 } }
            ]
        }));

        assert!(changes.iter().all(|c| c.account_index != 1));
    }

    #[test]
    fn test_native_token_mix_skipped() {
        // Token account created during the tx: native before, token after
        let changes = changes_for(json!({
            "preBalances": [5000000, 0, 30],
            "postBalances": [2960720, 2039280, 30],
            "preTokenBalances": [],
            "postTokenBalances": [
                { "accountIndex": 1, "mint": "MintA", "uiTokenAmount": { "amount": "42", "decimals": 0 } }
            ]
        }));

        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.account_index != 1));
    }

    #[test]
    fn test_missing_token_balance_lists() {
        let changes = changes_for(json!({
            "preBalances": [1000000, 2000000],
            "postBalances": [1500000, 1500000]
        }));

        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.asset.is_native()));
        assert_eq!(changes[0].raw_change, 500000);
        assert_eq!(changes[1].raw_change, -500000);
    }

    #[test]
    fn test_decimal_amount_matches_raw_delta() {
        let changes = changes_for(json!({
            "preBalances": [1234567891, 0, 0],
            "postBalances": [1000000000, 0, 0],
            "preTokenBalances": [
                { "accountIndex": 2, "mint": "MintA", "uiTokenAmount": { "amount": "123456789", "decimals": 6 } }
            ],
            "postTokenBalances": [
                { "accountIndex": 2, "mint": "MintA", "uiTokenAmount": { "amount": "1", "decimals": 6 } }
            ]
        }));

        for change in &changes {
            let recomputed = change.raw_change as f64 / 10f64.powi(change.decimals as i32);
            assert_eq!(change.amount, recomputed);
        }
        let native = &changes[0];
        assert!((native.amount - (-0.234567891)).abs() < 1e-9);
    }

    #[test]
    fn test_asset_display() {
        assert_eq!(AssetId::Native.to_string(), "SOL");
        assert_eq!(AssetId::Mint("MINTX".into()).to_string(), "MINTX");
    }
}
