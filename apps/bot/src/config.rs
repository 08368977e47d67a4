use anyhow::{Result, anyhow};
use clap::Parser;
use std::env;
use std::time::Duration;

use swap_core::RAYDIUM_ROUTE_PROGRAM_ID;

#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// Parse one transaction signature, print the swap as JSON and exit
    #[arg(long, value_name = "SIGNATURE", conflicts_with = "balance")]
    pub parse: Option<String>,

    /// Print one wallet's balance and exit
    #[arg(long, value_name = "ADDRESS")]
    pub balance: Option<String>,
}

#[derive(Clone)]
pub struct Config {
    pub bot_token: String,
    pub rpc_url: String,
    pub price_api_url: String,
    pub swap_program_id: String,
    pub commitment: String,
    pub http_timeout: Duration,
}

// Keep the token out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"<redacted>")
            .field("rpc_url", &self.rpc_url)
            .field("price_api_url", &self.price_api_url)
            .field("swap_program_id", &self.swap_program_id)
            .field("commitment", &self.commitment)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

pub fn load() -> Result<Config> {
    from_lookup(|key| env::var(key).ok())
}

/// Build the config from any key lookup; every required key is checked
/// before returning.
pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let missing: Vec<&str> = ["TELEGRAM_BOT_TOKEN", "RPC_ENDPOINT", "EXCHANGE_RATE_API_URL"]
        .into_iter()
        .filter(|key| get(key).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(anyhow!("missing environment variables: {}", missing.join(", ")));
    }

    let bot_token = get("TELEGRAM_BOT_TOKEN").unwrap_or_default();
    let rpc_url = get("RPC_ENDPOINT").unwrap_or_default();
    let price_api_url = get("EXCHANGE_RATE_API_URL").unwrap_or_default();

    let swap_program_id = get("SWAP_PROGRAM_ID").unwrap_or_else(|| RAYDIUM_ROUTE_PROGRAM_ID.to_string());
    let commitment = get("RPC_COMMITMENT").unwrap_or_else(|| "confirmed".to_string());

    let http_timeout_secs = match get("HTTP_TIMEOUT_SECS") {
        Some(v) => v
            .parse::<u64>()
            .map_err(|e| anyhow!("HTTP_TIMEOUT_SECS must be a whole number of seconds: {e}"))?,
        None => 30,
    };

    if !matches!(commitment.as_str(), "processed" | "confirmed" | "finalized") {
        return Err(anyhow!("RPC_COMMITMENT must be processed, confirmed or finalized, got {commitment}"));
    }

    Ok(Config {
        bot_token,
        rpc_url,
        price_api_url,
        swap_program_id,
        commitment,
        http_timeout: Duration::from_secs(http_timeout_secs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("TELEGRAM_BOT_TOKEN", "123:abc"),
        ("RPC_ENDPOINT", "https://api.mainnet-beta.solana.com"),
        ("EXCHANGE_RATE_API_URL", "https://api.coingecko.com/api/v3/simple/price?ids=solana&vs_currencies=usd"),
    ];

    #[test]
    fn test_defaults() {
        let cfg = from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(cfg.bot_token, "123:abc");
        assert_eq!(cfg.rpc_url, "https://api.mainnet-beta.solana.com");
        assert_eq!(cfg.swap_program_id, RAYDIUM_ROUTE_PROGRAM_ID);
        assert_eq!(cfg.commitment, "confirmed");
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_required_fails_fast() {
        let err = from_lookup(lookup_from(&[("RPC_ENDPOINT", "http://localhost:8899")])).unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("TELEGRAM_BOT_TOKEN"));
        assert!(msg.contains("EXCHANGE_RATE_API_URL"));
        assert!(!msg.contains("RPC_ENDPOINT"));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs[0] = ("TELEGRAM_BOT_TOKEN", "   ");
        let err = from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SWAP_PROGRAM_ID", "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8"));
        pairs.push(("RPC_COMMITMENT", "finalized"));
        pairs.push(("HTTP_TIMEOUT_SECS", "5"));

        let cfg = from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(cfg.swap_program_id, "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8");
        assert_eq!(cfg.commitment, "finalized");
        assert_eq!(cfg.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_bad_values_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("HTTP_TIMEOUT_SECS", "soon"));
        assert!(from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RPC_COMMITMENT", "recent"));
        assert!(from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let cfg = from_lookup(lookup_from(&REQUIRED)).unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("123:abc"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn test_cli_modes_conflict() {
        assert!(Cli::try_parse_from(["bot", "--parse", "sig", "--balance", "addr"]).is_err());

        let cli = Cli::try_parse_from(["bot", "--balance", "addr"]).unwrap();
        assert_eq!(cli.balance.as_deref(), Some("addr"));
        assert!(cli.parse.is_none());
    }
}
