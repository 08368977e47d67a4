//! Wallet balance lookup with a USD estimate.

use anyhow::Result;
use async_trait::async_trait;

use swap_core::{LookupError, NATIVE_DECIMALS};

use crate::price::PriceClient;
use crate::rpc::RpcClient;

const PUBKEY_LEN: usize = 32;

#[async_trait]
pub trait LamportSource: Send + Sync {
    async fn lamports(&self, address: &str) -> Result<u64>;
}

#[async_trait]
pub trait UsdRate: Send + Sync {
    async fn sol_usd(&self) -> Result<f64>;
}

#[async_trait]
impl LamportSource for RpcClient {
    async fn lamports(&self, address: &str) -> Result<u64> {
        self.get_balance(address).await
    }
}

#[async_trait]
impl UsdRate for PriceClient {
    async fn sol_usd(&self) -> Result<f64> {
        PriceClient::sol_usd(self).await
    }
}

pub struct WalletService<B, P> {
    balances: B,
    prices: P,
}

impl<B: LamportSource, P: UsdRate> WalletService<B, P> {
    pub fn new(balances: B, prices: P) -> Self {
        Self { balances, prices }
    }

    /// `Wallet Balance: 1.50 SOL (~225.00 USD)`
    pub async fn balance_display(&self, address: &str) -> Result<String, LookupError> {
        let address = validate_address(address)?;

        let lamports = self
            .balances
            .lamports(address)
            .await
            .map_err(|e| LookupError::upstream(format!("{e:#}")))?;
        let rate = self
            .prices
            .sol_usd()
            .await
            .map_err(|e| LookupError::upstream(format!("{e:#}")))?;

        Ok(format_balance(lamports, rate))
    }
}

/// Accept only base58 strings that decode to a 32-byte public key.
pub fn validate_address(address: &str) -> Result<&str, LookupError> {
    let address = address.trim();
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| LookupError::upstream(format!("invalid wallet address: {e}")))?;

    if bytes.len() != PUBKEY_LEN {
        return Err(LookupError::upstream(format!(
            "invalid wallet address: expected {PUBKEY_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(address)
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 10f64.powi(NATIVE_DECIMALS as i32)
}

pub fn format_balance(lamports: u64, usd_rate: f64) -> String {
    let sol = lamports_to_sol(lamports);
    format!("Wallet Balance: {:.2} SOL (~{:.2} USD)", sol, sol * usd_rate)
}
