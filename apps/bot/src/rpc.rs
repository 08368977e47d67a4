use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

use swap_core::{LookupError, TransactionSnapshot, TransactionSource};

/// Minimal Solana JSON-RPC client. One attempt per call, no retries.
#[derive(Clone)]
pub struct RpcClient {
    http: Client,
    url: String,
    commitment: String,
}

impl RpcClient {
    pub fn new(url: String, commitment: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("build rpc http client")?;

        Ok(Self {
            http,
            url,
            commitment,
        })
    }

    /// `Ok(None)` when the node does not know the signature.
    pub async fn get_transaction(&self, signature: &str) -> Result<Option<TransactionSnapshot>> {
        let params = json!([
            signature,
            {
                "encoding": "jsonParsed",
                "commitment": self.commitment,
                "maxSupportedTransactionVersion": 0
            }
        ]);
        let result = self.call("getTransaction", params).await?;
        if result.is_null() {
            return Ok(None);
        }

        let snapshot = TransactionSnapshot::from_json(&result)
            .map_err(|e| anyhow!("unexpected getTransaction shape: {e}"))?;
        Ok(Some(snapshot))
    }

    /// Lamports held by `address`.
    pub async fn get_balance(&self, address: &str) -> Result<u64> {
        let params = json!([address, { "commitment": self.commitment }]);
        let result = self.call("getBalance", params).await?;
        lamports_from_result(&result)
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });
        debug!("rpc {method}");

        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("rpc {method} request failed: {e}"))?;

        let status = resp.status();
        let v: Value = resp
            .json()
            .await
            .map_err(|e| anyhow!("rpc {method} decode error (status {status}): {e}"))?;

        if !status.is_success() && v.get("error").is_none() {
            return Err(anyhow!("rpc {method} non-success status: {status} body: {v}"));
        }

        into_result(v)
    }
}

/// Unwrap a JSON-RPC envelope into its `result`, surfacing `error` members.
fn into_result(mut v: Value) -> Result<Value> {
    if let Some(error) = v.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string())
            .unwrap_or_else(|| error.to_string());
        return Err(anyhow!("RPC error: {message}"));
    }

    v.get_mut("result")
        .map(Value::take)
        .ok_or_else(|| anyhow!("missing result field"))
}

fn lamports_from_result(result: &Value) -> Result<u64> {
    result
        .get("value")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| anyhow!("getBalance result has no lamport value: {result}"))
}

#[async_trait]
impl TransactionSource for RpcClient {
    async fn fetch_transaction(&self, signature: &str) -> Result<Option<TransactionSnapshot>, LookupError> {
        self.get_transaction(signature)
            .await
            .map_err(|e| LookupError::upstream(format!("{e:#}")))
    }
}
