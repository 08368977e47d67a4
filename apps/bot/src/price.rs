use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// `{"solana": {"usd": 123.45}}`
#[derive(Debug, Deserialize)]
struct PriceResponse {
    solana: UsdQuote,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    usd: f64,
}

/// Fetches the SOL/USD rate from a simple-price style endpoint.
#[derive(Clone)]
pub struct PriceClient {
    http: Client,
    url: String,
}

impl PriceClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("build price http client")?;
        Ok(Self { http, url })
    }

    pub async fn sol_usd(&self) -> Result<f64> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| anyhow!("price request failed: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("price endpoint returned {status}"));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| anyhow!("price body read failed: {e}"))?;
        parse_sol_usd(&body)
    }
}

fn parse_sol_usd(body: &str) -> Result<f64> {
    let parsed: PriceResponse =
        serde_json::from_str(body).map_err(|e| anyhow!("unexpected price response: {e}"))?;
    Ok(parsed.solana.usd)
}
