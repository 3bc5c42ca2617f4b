//! Constant Product Pair
//!
//! Uniswap-V2-style pool quoting with the 0.30% LP fee (997/1000).
//! Unlike on-chain factories, token0/token1 are taken as given, not sorted.
//!
//! Created: 2026-10-15

use alloy::primitives::{Address, U256};

use super::LiquidityVenue;
use crate::errors::RouterError;

const FEE_NUMERATOR: u64 = 997;
const FEE_DENOMINATOR: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: U256,
    pub reserve1: U256,
}

impl Pair {
    pub fn new(address: Address, token0: Address, token1: Address) -> Self {
        Self {
            address,
            token0,
            token1,
            reserve0: U256::ZERO,
            reserve1: U256::ZERO,
        }
    }

    /// (token_in, token_out) for a swap direction; `zero_for_one` means token0 is sold
    pub fn direction_tokens(&self, zero_for_one: bool) -> (Address, Address) {
        if zero_for_one {
            (self.token0, self.token1)
        } else {
            (self.token1, self.token0)
        }
    }

    /// (reserve_in, reserve_out) for a swap direction
    pub fn direction_reserves(&self, zero_for_one: bool) -> (U256, U256) {
        if zero_for_one {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        }
    }

    /// Calculate amount out for a given input
    ///
    /// Formula: amount_out = (amount_in * 997 * reserve_out) / (reserve_in * 1000 + amount_in * 997)
    pub fn get_amount_out(
        &self,
        amount_in: U256,
        reserve_in: U256,
        reserve_out: U256,
    ) -> Result<U256, RouterError> {
        if amount_in.is_zero() {
            return Err(self.insufficient("insufficient input amount"));
        }
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(self.insufficient("insufficient liquidity"));
        }

        let amount_in_with_fee = checked_mul(amount_in, U256::from(FEE_NUMERATOR))?;
        let numerator = checked_mul(amount_in_with_fee, reserve_out)?;
        let denominator = checked_mul(reserve_in, U256::from(FEE_DENOMINATOR))?
            .checked_add(amount_in_with_fee)
            .ok_or(RouterError::ArithmeticOverflow)?;

        let amount_out = numerator / denominator;
        if amount_out.is_zero() {
            return Err(self.insufficient("insufficient output amount"));
        }
        Ok(amount_out)
    }

    /// Calculate amount in required to get a specific output
    ///
    /// Formula: amount_in = (reserve_in * amount_out * 1000) / ((reserve_out - amount_out) * 997) + 1
    pub fn get_amount_in(
        &self,
        amount_out: U256,
        reserve_in: U256,
        reserve_out: U256,
    ) -> Result<U256, RouterError> {
        if amount_out.is_zero() {
            return Err(self.insufficient("insufficient output amount"));
        }
        if reserve_in.is_zero() || amount_out >= reserve_out {
            return Err(self.insufficient("insufficient liquidity"));
        }

        let numerator = checked_mul(
            checked_mul(reserve_in, amount_out)?,
            U256::from(FEE_DENOMINATOR),
        )?;
        let denominator = checked_mul(reserve_out - amount_out, U256::from(FEE_NUMERATOR))?;

        Ok(numerator / denominator + U256::from(1))
    }

    fn insufficient(&self, reason: &'static str) -> RouterError {
        RouterError::InsufficientLiquidity {
            venue: self.address,
            reason,
        }
    }
}

fn checked_mul(a: U256, b: U256) -> Result<U256, RouterError> {
    a.checked_mul(b).ok_or(RouterError::ArithmeticOverflow)
}

impl LiquidityVenue for Pair {
    fn address(&self) -> Address {
        self.address
    }

    fn tokens(&self) -> (Address, Address) {
        (self.token0, self.token1)
    }

    fn reserves(&self) -> (U256, U256) {
        (self.reserve0, self.reserve1)
    }

    fn amount_out(&self, amount_in: U256, zero_for_one: bool) -> Result<U256, RouterError> {
        let (reserve_in, reserve_out) = self.direction_reserves(zero_for_one);
        self.get_amount_out(amount_in, reserve_in, reserve_out)
    }

    fn amount_in(&self, amount_out: U256, zero_for_one: bool) -> Result<U256, RouterError> {
        let (reserve_in, reserve_out) = self.direction_reserves(zero_for_one);
        self.get_amount_in(amount_out, reserve_in, reserve_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Pair {
        let mut pair = Pair::new(
            Address::repeat_byte(0x99),
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x02),
        );
        pair.reserve0 = U256::from(100_000_000_000_000_000_000u128); // 100 ETH
        pair.reserve1 = U256::from(200_000_000_000u64); // 200,000 USDC (6 decimals)
        pair
    }

    #[test]
    fn test_get_amount_out() {
        let amount_out = pool()
            .amount_out(U256::from(1_000_000_000_000_000_000u64), true)
            .unwrap();

        // Should get approximately 1976 USDC (with fee and slippage)
        assert!(amount_out > U256::from(1_970_000_000u64));
        assert!(amount_out < U256::from(2_000_000_000u64));
    }

    #[test]
    fn test_get_amount_in_covers_amount_out() {
        let pair = pool();
        let wanted = U256::from(1_000_000_000u64); // 1000 USDC
        let needed = pair.amount_in(wanted, true).unwrap();

        assert!(pair.amount_out(needed, true).unwrap() >= wanted);
    }

    #[test]
    fn test_zero_and_exhausted_liquidity() {
        let pair = pool();
        assert!(matches!(
            pair.amount_out(U256::ZERO, true),
            Err(RouterError::InsufficientLiquidity { .. })
        ));
        assert!(matches!(
            pair.amount_in(pair.reserve1, true),
            Err(RouterError::InsufficientLiquidity { .. })
        ));

        let empty = Pair::new(Address::ZERO, Address::ZERO, Address::ZERO);
        assert!(matches!(
            empty.amount_out(U256::from(1), false),
            Err(RouterError::InsufficientLiquidity { .. })
        ));
    }

    #[test]
    fn test_dust_input_rounds_to_nothing() {
        // 1 wei of ETH buys less than one USDC unit
        assert!(matches!(
            pool().amount_out(U256::from(1), true),
            Err(RouterError::InsufficientLiquidity {
                reason: "insufficient output amount",
                ..
            })
        ));
    }

    #[test]
    fn test_direction_selects_reserves() {
        let pair = pool();
        assert_eq!(pair.direction_reserves(false), (pair.reserve1, pair.reserve0));
        assert_eq!(pair.direction_tokens(true), (pair.token0, pair.token1));
    }
}
