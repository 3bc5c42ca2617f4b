//! Core trade data structures
//!
//! Value types shared by the router, fee engine, authorization verifier and
//! swap executors. All of these are built per call from the incoming request
//! and never persisted.
//!
//! Created: 2026-10-15

use alloy::primitives::{address, Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::auth::Permit;
use crate::fees::FeeDescriptor;

/// Wire address standing in for the chain's native asset
pub const NATIVE_ASSET_ADDRESS: Address = address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");

/// An asset the router can move: the native coin, or a token contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Asset {
    Native,
    Token(Address),
}

impl Asset {
    /// Map a wire address to an asset (the native sentinel becomes `Native`)
    pub fn from_address(address: Address) -> Self {
        if address == NATIVE_ASSET_ADDRESS {
            Asset::Native
        } else {
            Asset::Token(address)
        }
    }

    /// Address used when hashing or encoding this asset
    pub fn address(&self) -> Address {
        match self {
            Asset::Native => NATIVE_ASSET_ADDRESS,
            Asset::Token(token) => *token,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    pub fn token(&self) -> Option<Address> {
        match self {
            Asset::Native => None,
            Asset::Token(token) => Some(*token),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Asset::Native => write!(f, "native"),
            Asset::Token(token) => write!(f, "{}", token),
        }
    }
}

impl FromStr for Asset {
    type Err = String;

    /// Accepts "native"/"eth" or a hex address
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" | "eth" => Ok(Asset::Native),
            other => other
                .parse::<Address>()
                .map(Asset::from_address)
                .map_err(|e| format!("invalid asset '{}': {}", s, e)),
        }
    }
}

/// Which side of the trade is exact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountMode {
    /// Spend exactly `input.amount`, receive at least `output.bound_amount`
    FixedInput,
    /// Receive exactly `output.bound_amount`, spend at most `input.amount`
    FixedOutput,
}

impl AmountMode {
    /// Wire value (1 = fixed inputs, 2 = fixed outputs)
    pub fn as_u8(&self) -> u8 {
        match self {
            AmountMode::FixedInput => 1,
            AmountMode::FixedOutput => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(AmountMode::FixedInput),
            2 => Some(AmountMode::FixedOutput),
            _ => None,
        }
    }
}

impl fmt::Display for AmountMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AmountMode::FixedInput => write!(f, "fixed_input"),
            AmountMode::FixedOutput => write!(f, "fixed_output"),
        }
    }
}

/// How `TradeInput::amount` is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountType {
    /// 18-decimal share of the trader's balance at call time (1e18 = 100%)
    Relative,
    /// Raw token units
    Absolute,
}

impl AmountType {
    pub fn as_u8(&self) -> u8 {
        match self {
            AmountType::Relative => 1,
            AmountType::Absolute => 2,
        }
    }
}

/// What the trader pays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeInput {
    pub asset: Asset,
    pub amount: U256,
    pub amount_type: AmountType,
    pub amount_mode: AmountMode,
    /// Owner-signed permit replacing a pre-existing allowance (tokens only)
    pub permit: Option<Permit>,
}

impl TradeInput {
    pub fn absolute(asset: Asset, amount: U256, amount_mode: AmountMode) -> Self {
        Self {
            asset,
            amount,
            amount_type: AmountType::Absolute,
            amount_mode,
            permit: None,
        }
    }

    /// Spend a share of the trader's current token balance (fixed input only)
    pub fn relative(token: Address, share: U256) -> Self {
        Self {
            asset: Asset::Token(token),
            amount: share,
            amount_type: AmountType::Relative,
            amount_mode: AmountMode::FixedInput,
            permit: None,
        }
    }

    pub fn with_permit(mut self, permit: Permit) -> Self {
        self.permit = Some(permit);
        self
    }
}

/// What the trader receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeOutput {
    pub asset: Asset,
    /// Minimum output (fixed input) or exact output (fixed output)
    pub bound_amount: U256,
}

impl TradeOutput {
    pub fn new(asset: Asset, bound_amount: U256) -> Self {
        Self { asset, bound_amount }
    }
}

/// Execution instructions for one trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapDescription {
    pub mode: AmountMode,
    /// Fee to the protocol (replaced by the configured default unless fee-signed)
    pub protocol_fee: FeeDescriptor,
    /// Fee to a second party such as a referrer or marketplace
    pub marketplace_fee: FeeDescriptor,
    pub trader: Address,
    /// Identifier of the swap executor that performs the conversion
    pub executor: Address,
    /// Executor-specific routing payload
    pub payload: Bytes,
}

/// Caller identity, attached native value and block time for one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub sender: Address,
    pub value: U256,
    /// Unix seconds, used for signature deadlines
    pub timestamp: u64,
}

impl CallContext {
    /// Call from `sender` with no value, stamped with the current wall clock
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            value: U256::ZERO,
            timestamp: chrono::Utc::now().timestamp().max(0) as u64,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Settlement report for a successful (or simulated) trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReceipt {
    pub mode: AmountMode,
    pub trader: Address,
    pub input_asset: Asset,
    pub output_asset: Asset,
    /// Total taken from the trader, fees included, refund excluded
    pub input_spent: U256,
    /// Amount handed to the executor (input net of fees)
    pub swapped: U256,
    pub output_delivered: U256,
    pub protocol_fee_amount: U256,
    pub marketplace_fee_amount: U256,
    /// Unspent ceiling returned to the trader (fixed output only)
    pub refunded: U256,
}

impl ExecutionReceipt {
    /// Realized settlement: output received (fixed input) or effective spend (fixed output)
    pub fn realized(&self) -> U256 {
        match self.mode {
            AmountMode::FixedInput => self.output_delivered,
            AmountMode::FixedOutput => self.input_spent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_sentinel_round_trip() {
        assert_eq!(Asset::from_address(NATIVE_ASSET_ADDRESS), Asset::Native);
        assert_eq!(Asset::Native.address(), NATIVE_ASSET_ADDRESS);
        assert!(Asset::Native.token().is_none());
    }

    #[test]
    fn test_asset_from_str() {
        assert_eq!("native".parse::<Asset>().unwrap(), Asset::Native);
        assert_eq!("ETH".parse::<Asset>().unwrap(), Asset::Native);

        let token: Asset = "0x6b175474e89094c44da98b954eedeac495271d0f".parse().unwrap();
        assert!(matches!(token, Asset::Token(_)));

        let sentinel: Asset = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee".parse().unwrap();
        assert_eq!(sentinel, Asset::Native);

        assert!("not-an-address".parse::<Asset>().is_err());
    }

    #[test]
    fn test_amount_mode_wire_values() {
        assert_eq!(AmountMode::FixedInput.as_u8(), 1);
        assert_eq!(AmountMode::FixedOutput.as_u8(), 2);
        assert_eq!(AmountMode::from_u8(2), Some(AmountMode::FixedOutput));
        assert_eq!(AmountMode::from_u8(0), None);
        assert_eq!(AmountMode::from_u8(3), None);
    }

    #[test]
    fn test_receipt_realized_by_mode() {
        let receipt = ExecutionReceipt {
            mode: AmountMode::FixedInput,
            trader: Address::ZERO,
            input_asset: Asset::Native,
            output_asset: Asset::Native,
            input_spent: U256::from(10),
            swapped: U256::from(9),
            output_delivered: U256::from(42),
            protocol_fee_amount: U256::ZERO,
            marketplace_fee_amount: U256::ZERO,
            refunded: U256::ZERO,
        };
        assert_eq!(receipt.realized(), U256::from(42));

        let fixed_output = ExecutionReceipt { mode: AmountMode::FixedOutput, ..receipt };
        assert_eq!(fixed_output.realized(), U256::from(10));
    }
}
