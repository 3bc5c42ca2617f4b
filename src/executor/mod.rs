//! Swap Executors
//!
//! An executor converts the router-held input into the requested output by
//! driving external liquidity venues. The router depends only on this trait.
//!
//! Calling convention:
//! - before the call the router holds the (net) input at `ctx.router`
//! - fixed input: the whole input is spent, the output lands at `ctx.router`,
//!   the realized output is returned
//! - fixed output: exactly `amount_out` lands at `ctx.router`, at most
//!   `max_amount_in` is spent, the amount spent is returned; the unspent
//!   remainder stays with the router
//!
//! Executors fail instead of returning partial or zero amounts.
//!
//! Created: 2026-10-15

pub mod uniswap;

pub use uniswap::{UniswapCaller, UniswapPayload};

use alloy::primitives::{Address, U256};

use crate::errors::RouterError;
use crate::ledger::Ledger;
use crate::types::{AmountMode, Asset};

/// Mutable view of the world handed to an executor for one call
pub struct ExecutionContext<'a> {
    pub ledger: &'a mut Ledger,
    /// Address holding the input and receiving the output
    pub router: Address,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(ledger: &'a mut Ledger, router: Address) -> Self {
        Self { ledger, router }
    }

    pub fn wrapped_native(&self) -> Address {
        self.ledger.wrapped_native()
    }
}

/// What the router asks an executor to do
#[derive(Debug, Clone, Copy)]
pub struct SwapRequest<'a> {
    pub mode: AmountMode,
    pub input: Asset,
    pub output: Asset,
    pub payload: &'a [u8],
}

pub trait SwapExecutor: Send + Sync {
    fn name(&self) -> &str;

    /// Decode and sanity-check the payload against the request; moves no funds
    fn validate(&self, ledger: &Ledger, request: &SwapRequest<'_>) -> Result<(), RouterError>;

    /// Spend exactly `amount_in`, return the output received
    fn execute_fixed_input(
        &self,
        ctx: &mut ExecutionContext<'_>,
        request: &SwapRequest<'_>,
        amount_in: U256,
    ) -> Result<U256, RouterError>;

    /// Receive exactly `amount_out`, spending at most `max_amount_in`; return the amount spent
    fn execute_fixed_output(
        &self,
        ctx: &mut ExecutionContext<'_>,
        request: &SwapRequest<'_>,
        amount_out: U256,
        max_amount_in: U256,
    ) -> Result<U256, RouterError>;
}
