//! Liquidity venues
//!
//! Read-side interface executors use to quote a hop. Settlement of a hop goes
//! through `Ledger::swap_pair`, which enforces the pool invariant.
//!
//! Created: 2026-10-15

pub mod pair;

pub use pair::Pair;

use alloy::primitives::{Address, U256};

use crate::errors::RouterError;

/// A two-token pool that can quote swaps in either direction
pub trait LiquidityVenue {
    fn address(&self) -> Address;

    /// (token0, token1)
    fn tokens(&self) -> (Address, Address);

    /// (reserve0, reserve1)
    fn reserves(&self) -> (U256, U256);

    /// Output for an exact input; `zero_for_one` sells token0
    fn amount_out(&self, amount_in: U256, zero_for_one: bool) -> Result<U256, RouterError>;

    /// Input required for an exact output; `zero_for_one` sells token0
    fn amount_in(&self, amount_out: U256, zero_for_one: bool) -> Result<U256, RouterError>;
}
