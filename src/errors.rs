//! Router Error Types
//!
//! Every failure inside a trade is an atomic abort: the ledger journal is
//! reverted and one of these reasons is surfaced to the caller. The CLI and the
//! config/scenario loaders wrap these in `anyhow` with context.
//!
//! Created: 2026-10-15

use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

use crate::types::Asset;

/// Why a signature-based authorization was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("signature is malformed or unrecoverable")]
    InvalidSignature,
    #[error("signature recovered {recovered}, expected {expected}")]
    WrongSigner { expected: Address, recovered: Address },
    #[error("authorization expired at {deadline} (now {now})")]
    Expired { deadline: U256, now: u64 },
    #[error("authorization already used by {signer} (key {key})")]
    AlreadyUsed { signer: Address, key: B256 },
    #[error("caller {sender} is not the trader {trader} and no account signature was supplied")]
    CallerNotTrader { sender: Address, trader: Address },
    #[error("fee signature supplied but no fee signer is configured")]
    NoFeeSigner,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("invalid routing payload: {0}")]
    InvalidPayload(String),

    #[error("degenerate trade rejected: {0}")]
    DegenerateTrade(&'static str),

    #[error("slippage exceeded: bound {bound}, actual {actual}")]
    SlippageExceeded { bound: U256, actual: U256 },

    #[error("insufficient liquidity in venue {venue}: {reason}")]
    InsufficientLiquidity { venue: Address, reason: &'static str },

    #[error("authorization failed: {0}")]
    AuthorizationFailed(AuthFailure),

    #[error("insufficient authorization: {required} required, {available} allowed")]
    InsufficientAuthorization { required: U256, available: U256 },

    #[error("swap mode {swap} does not match input mode {input}")]
    ModeMismatch { swap: u8, input: u8 },

    #[error("no swap executor registered at {0}")]
    UnknownExecutor(Address),

    #[error("invalid fee configuration: {0}")]
    InvalidFee(String),

    #[error("insufficient balance of {asset} for {account}: {required} required, {available} held")]
    InsufficientBalance {
        asset: Asset,
        account: Address,
        required: U256,
        available: U256,
    },

    #[error("native value mismatch: expected {expected}, attached {attached}")]
    NativeValueMismatch { expected: U256, attached: U256 },

    #[error("caller {0} is not the router owner")]
    Unauthorized(Address),

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("router state unavailable (lock poisoned)")]
    StateUnavailable,
}

impl From<AuthFailure> for RouterError {
    fn from(failure: AuthFailure) -> Self {
        RouterError::AuthorizationFailed(failure)
    }
}
