//! TransactionSnapshot: typed view of a `getTransaction` result.
//!
//! The RPC returns `jsonParsed` transactions; this module deserializes the
//! parts the swap pipeline reads (account keys, top-level instructions,
//! block time, balance metadata) into plain structs so the parsers stay
//! pure functions over owned data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A confirmed transaction as returned by `getTransaction` (`jsonParsed`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSnapshot {
    #[serde(default)]
    pub slot: u64,

    /// Block timestamp (Unix seconds)
    #[serde(default)]
    pub block_time: Option<i64>,

    pub transaction: TransactionEnvelope,

    /// Status metadata. `null` when the node pruned it.
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    #[serde(default)]
    pub signatures: Vec<String>,
    pub message: Message,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Full key list; for v0 transactions this already includes
    /// lookup-table addresses (`source: "lookupTable"`).
    #[serde(default)]
    pub account_keys: Vec<AccountKey>,

    /// Top-level instructions only.
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKey {
    pub pubkey: String,
    #[serde(default)]
    pub signer: bool,
    #[serde(default)]
    pub writable: bool,
}

/// An instruction in one of the two shapes `jsonParsed` produces.
///
/// Programs the node knows how to decode come back as `Parsed`; everything
/// else keeps its raw account list and data as `Raw`. Variant order matters
/// for the untagged match: a `parsed` member selects `Parsed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instruction {
    Parsed(ParsedInstruction),
    Raw(RawInstruction),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInstruction {
    #[serde(default)]
    pub program: Option<String>,
    pub program_id: String,
    /// Decoded document, usually `{"type": .., "info": {..}}`.
    pub parsed: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstruction {
    pub program_id: String,
    /// Account pubkeys in instruction order
    #[serde(default)]
    pub accounts: Vec<String>,
    /// Base58-encoded instruction data
    #[serde(default)]
    pub data: Option<String>,
}

impl Instruction {
    pub fn program_id(&self) -> &str {
        match self {
            Instruction::Parsed(ix) => &ix.program_id,
            Instruction::Raw(ix) => &ix.program_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    #[serde(default)]
    pub err: Option<Value>,

    #[serde(default)]
    pub fee: u64,

    /// Native balances (lamports), aligned with `account_keys`
    #[serde(default)]
    pub pre_balances: Vec<u64>,

    #[serde(default)]
    pub post_balances: Vec<u64>,

    #[serde(default)]
    pub pre_token_balances: Option<Vec<TokenBalance>>,

    #[serde(default)]
    pub post_token_balances: Option<Vec<TokenBalance>>,
}

/// Token account balance entry from `pre/postTokenBalances`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub account_index: u32,
    pub mint: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub ui_token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiTokenAmount {
    /// Amount in base units, as a decimal string
    pub amount: String,
    pub decimals: u8,
}

impl TransactionSnapshot {
    pub fn from_json(tx: &Value) -> serde_json::Result<Self> {
        Self::deserialize(tx)
    }

    /// Check if a top-level instruction invokes `program_id`
    pub fn has_program(&self, program_id: &str) -> bool {
        self.transaction
            .message
            .instructions
            .iter()
            .any(|ix| ix.program_id() == program_id)
    }

    /// First top-level instruction for `program_id`
    pub fn first_instruction_for(&self, program_id: &str) -> Option<&Instruction> {
        self.transaction
            .message
            .instructions
            .iter()
            .find(|ix| ix.program_id() == program_id)
    }

    /// First account key flagged as signer (the fee payer for normal txs)
    pub fn signer(&self) -> Option<&str> {
        self.transaction
            .message
            .account_keys
            .iter()
            .find(|k| k.signer)
            .map(|k| k.pubkey.as_str())
    }

    pub fn account_key(&self, index: usize) -> Option<&str> {
        self.transaction
            .message
            .account_keys
            .get(index)
            .map(|k| k.pubkey.as_str())
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.block_time.unwrap_or(0) * 1000
    }
}
