pub mod balance;
pub mod classify;
pub mod error;
pub mod parser;
pub mod pool;
pub mod snapshot;
pub mod swap;

// Extraction and classification
pub use balance::{compute_balance_changes, AssetId, BalanceChange, NATIVE_DECIMALS, NATIVE_SYMBOL};
pub use classify::{classify, legs_for_wallet, SwapLegs, TradeType};

// Pool id resolution
pub use pool::{resolve_pool_id, RAYDIUM_ROUTE_PROGRAM_ID};

// Swap record
pub use swap::{assemble, extract_swap_details, Swap, SwapDetails};

// Orchestration
pub use error::LookupError;
pub use parser::{parse_snapshot, SwapParser, TransactionSource};
pub use snapshot::{Instruction, TransactionSnapshot};
