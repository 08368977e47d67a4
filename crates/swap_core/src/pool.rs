//! Pool id resolution for the tracked swap program.
//!
//! The pool account comes from the first top-level instruction of the swap
//! program. How it is read depends on the instruction shape:
//! - `Parsed`: the decoded `info.ammId` field
//! - `Raw`: the first account in the instruction's account list

use crate::snapshot::{Instruction, TransactionSnapshot};

/// Raydium route program. Swaps routed through it are the ones this crate tracks.
pub const RAYDIUM_ROUTE_PROGRAM_ID: &str = "routeUGWgWzqBWFcrCfv8tritsqukccJPu3q5GPP3xS";

/// Index of the pool account in a raw swap instruction's account list
const POOL_ACCOUNT_INDEX: usize = 0;

/// Find the pool id for `program_id` in a transaction.
///
/// Returns `None` when the program is not invoked at the top level or its
/// instruction carries no pool reference.
pub fn resolve_pool_id(snapshot: &TransactionSnapshot, program_id: &str) -> Option<String> {
    snapshot
        .first_instruction_for(program_id)
        .and_then(pool_id_from_instruction)
}

pub fn pool_id_from_instruction(ix: &Instruction) -> Option<String> {
    match ix {
        Instruction::Parsed(parsed) => parsed
            .parsed
            .pointer("/info/ammId")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string()),
        Instruction::Raw(raw) => raw
            .accounts
            .get(POOL_ACCOUNT_INDEX)
            .filter(|s| !s.is_empty())
            .cloned(),
    }
}
