//! Chat session controller.
//!
//! Turns one chat input plus that chat's state into replies. The state is
//! owned by the caller and passed in on every turn; nothing here is shared
//! between chats.

use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};

use swap_core::{LookupError, Swap, SwapParser};

use crate::balance::WalletService;
use crate::price::PriceClient;
use crate::rpc::RpcClient;

pub const CB_PARSE_SWAP: &str = "parse_swap";
pub const CB_GET_BALANCE: &str = "get_balance";

pub const MSG_WELCOME: &str = "Welcome! What do you want to do?";
pub const MSG_WELCOME_BACK: &str = "Welcome back! What would you like to do next?";
pub const MSG_ASK_SIGNATURE: &str = "Sure! Please enter the transaction signature:";
pub const MSG_ASK_ADDRESS: &str = "No problem! Please enter your wallet address:";
pub const MSG_PROCESSING: &str = "Processing your transaction signature...";
pub const MSG_FETCHING: &str = "Fetching your wallet balance...";
pub const MSG_NOT_A_SWAP: &str =
    "❌ Couldn't parse the transaction as a Raydium swap. Please make sure the signature is correct.";
pub const MSG_USE_MENU: &str = "ℹ️ Please select an option from the menu using /start or the buttons below.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Awaiting {
    ParseSwap,
    WalletBalance,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub awaiting: Option<Awaiting>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    Start,
    Callback(&'a str),
    Text(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Plain(String),
    /// MarkdownV2, already escaped
    Markdown(String),
    /// Text followed by the main menu keyboard
    Menu(String),
}

#[async_trait]
pub trait Replier: Send + Sync {
    async fn send(&self, reply: Reply) -> Result<()>;
}

/// Lookups the controller dispatches to.
#[async_trait]
pub trait Services: Send + Sync {
    async fn parse_swap(&self, signature: &str) -> Result<Option<Swap>, LookupError>;
    async fn wallet_balance(&self, address: &str) -> Result<String, LookupError>;
}

/// Production services over one RPC connection and the price endpoint.
pub struct Backend {
    pub parser: SwapParser<RpcClient>,
    pub wallet: WalletService<RpcClient, PriceClient>,
}

#[async_trait]
impl Services for Backend {
    async fn parse_swap(&self, signature: &str) -> Result<Option<Swap>, LookupError> {
        self.parser.parse_swap_transaction(signature).await
    }

    async fn wallet_balance(&self, address: &str) -> Result<String, LookupError> {
        self.wallet.balance_display(address).await
    }
}

/// Handle one input for one chat.
///
/// Lookup failures become user-facing replies; only a failure to deliver a
/// reply is returned as an error.
pub async fn handle<S, R>(state: &mut SessionState, services: &S, replier: &R, input: Input<'_>) -> Result<()>
where
    S: Services + ?Sized,
    R: Replier + ?Sized,
{
    match input {
        Input::Start => {
            state.awaiting = None;
            replier.send(Reply::Menu(MSG_WELCOME.to_string())).await
        }
        Input::Callback(CB_PARSE_SWAP) => {
            state.awaiting = Some(Awaiting::ParseSwap);
            replier.send(Reply::Plain(MSG_ASK_SIGNATURE.to_string())).await
        }
        Input::Callback(CB_GET_BALANCE) => {
            state.awaiting = Some(Awaiting::WalletBalance);
            replier.send(Reply::Plain(MSG_ASK_ADDRESS.to_string())).await
        }
        Input::Callback(other) => {
            warn!("unknown callback data: {other}");
            replier.send(Reply::Menu(MSG_WELCOME_BACK.to_string())).await
        }
        Input::Text(text) => match state.awaiting.take() {
            Some(Awaiting::ParseSwap) => {
                replier.send(Reply::Plain(MSG_PROCESSING.to_string())).await?;
                let reply = swap_reply(services, text.trim()).await;
                replier.send(reply).await?;
                replier.send(Reply::Menu(MSG_WELCOME_BACK.to_string())).await
            }
            Some(Awaiting::WalletBalance) => {
                replier.send(Reply::Plain(MSG_FETCHING.to_string())).await?;
                let reply = balance_reply(services, text.trim()).await;
                replier.send(reply).await?;
                replier.send(Reply::Menu(MSG_WELCOME_BACK.to_string())).await
            }
            None => {
                replier.send(Reply::Plain(MSG_USE_MENU.to_string())).await?;
                replier.send(Reply::Menu(MSG_WELCOME_BACK.to_string())).await
            }
        },
    }
}

async fn swap_reply<S: Services + ?Sized>(services: &S, signature: &str) -> Reply {
    match services.parse_swap(signature).await {
        Ok(Some(swap)) => {
            info!("parsed swap sig={} type={} pool={}", swap.signature, swap.trade_type, swap.pool_id);
            match serde_json::to_string_pretty(&swap) {
                Ok(json) => Reply::Markdown(format!(
                    "✅ *Parsed Swap Transaction Details:*\n```json\n{}\n```",
                    escape_code(&json)
                )),
                Err(e) => Reply::Plain(format!("❌ Error parsing transaction: {e}")),
            }
        }
        Ok(None) => {
            info!("sig={signature} is not a qualifying swap");
            Reply::Plain(MSG_NOT_A_SWAP.to_string())
        }
        Err(e) => {
            warn!("swap lookup failed for sig={signature}: {e}");
            Reply::Plain(format!("❌ Error parsing transaction: {e}"))
        }
    }
}

async fn balance_reply<S: Services + ?Sized>(services: &S, address: &str) -> Reply {
    match services.wallet_balance(address).await {
        Ok(balance) => Reply::Plain(format!("✅ Wallet Balance:\n{balance}")),
        Err(e) => {
            warn!("balance lookup failed for {address}: {e}");
            Reply::Plain(format!("❌ Error fetching wallet balance: {e}"))
        }
    }
}

/// Inside MarkdownV2 code blocks only '`' and '\' need escaping.
fn escape_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '`' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
