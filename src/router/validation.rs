//! Request checks that run before any funds move

use alloy::primitives::U256;

use crate::errors::RouterError;
use crate::fees::Share;
use crate::ledger::Ledger;
use crate::types::{AmountMode, AmountType, Asset, SwapDescription, TradeInput, TradeOutput};

pub fn check_mode(input: &TradeInput, swap: &SwapDescription) -> Result<(), RouterError> {
    if input.amount_mode != swap.mode {
        return Err(RouterError::ModeMismatch {
            swap: swap.mode.as_u8(),
            input: input.amount_mode.as_u8(),
        });
    }
    Ok(())
}

/// Turn a relative amount into token units against the trader's current balance
pub fn resolve_amount(
    ledger: &Ledger,
    input: &TradeInput,
    swap: &SwapDescription,
) -> Result<U256, RouterError> {
    match input.amount_type {
        AmountType::Absolute => Ok(input.amount),
        AmountType::Relative => {
            if input.asset.is_native() {
                return Err(RouterError::DegenerateTrade(
                    "relative amount is not allowed for native input",
                ));
            }
            if swap.mode != AmountMode::FixedInput {
                return Err(RouterError::DegenerateTrade(
                    "relative amount is only allowed with fixed input",
                ));
            }
            let share = Share::from_raw(input.amount);
            if !share.is_valid() {
                return Err(RouterError::DegenerateTrade("relative amount exceeds 100%"));
            }
            share.apply(ledger.balance_of(input.asset, swap.trader))
        }
    }
}

pub fn check_degenerate(
    mode: AmountMode,
    amount: U256,
    output: &TradeOutput,
) -> Result<(), RouterError> {
    match mode {
        AmountMode::FixedInput if amount.is_zero() => {
            Err(RouterError::DegenerateTrade("zero input amount"))
        }
        AmountMode::FixedOutput if output.bound_amount.is_zero() => {
            Err(RouterError::DegenerateTrade("zero output amount"))
        }
        AmountMode::FixedOutput if amount.is_zero() => {
            Err(RouterError::DegenerateTrade("zero input ceiling"))
        }
        _ => Ok(()),
    }
}

/// A same-asset trade cannot be measured by balance deltas at the router
pub fn check_distinct_assets(input: Asset, output: Asset) -> Result<(), RouterError> {
    if input == output {
        return Err(RouterError::InvalidPayload(format!(
            "input and output are the same asset ({})",
            input
        )));
    }
    Ok(())
}

/// Native input must arrive as exactly the call value; token input must carry none
pub fn check_call_value(asset: Asset, amount: U256, attached: U256) -> Result<(), RouterError> {
    let expected = if asset.is_native() { amount } else { U256::ZERO };
    if attached != expected {
        return Err(RouterError::NativeValueMismatch { expected, attached });
    }
    Ok(())
}
