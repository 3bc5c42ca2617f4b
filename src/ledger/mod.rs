//! In-memory ledger
//!
//! Asset-transfer interface the router and executors settle against:
//! native and token balances, allowances, wrapped native, V2-style pools and
//! the per-signer used-nonce set. A checkpoint/revert journal makes every
//! router call all-or-nothing.
//!
//! Created: 2026-10-15

mod journal;
mod state;

pub use journal::Checkpoint;
pub use state::Ledger;
