//! Fee Engine
//!
//! Fee shares are 18-decimal fixed-point fractions (1e18 = 100%).
//! Fee amount = floor(amount * share / 1e18); the net amount handed to an
//! executor is always derived by subtraction so that
//! `protocol_fee + marketplace_fee + net == amount` holds exactly.
//!
//! Created: 2026-10-15

use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use std::fmt;

use crate::errors::RouterError;

/// 1e18, the fixed-point scale of a `Share`
pub const SHARE_SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

const SHARE_DECIMALS: u32 = 18;

/// Fraction of an amount, 18-decimal fixed point
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Share(U256);

impl Share {
    pub const ZERO: Share = Share(U256::ZERO);
    pub const ONE: Share = Share(SHARE_SCALE);

    pub fn from_raw(raw: U256) -> Self {
        Share(raw)
    }

    pub fn raw(&self) -> U256 {
        self.0
    }

    /// Parse a human decimal such as `0.01` (1%). Digits past 18 decimals are floored.
    pub fn from_decimal(value: Decimal) -> Result<Self, RouterError> {
        if value.is_sign_negative() {
            return Err(RouterError::InvalidFee(format!("negative share {}", value)));
        }
        if value > Decimal::ONE {
            return Err(RouterError::InvalidFee(format!("share {} exceeds 100%", value)));
        }

        let mantissa = U256::from(value.mantissa().unsigned_abs());
        let scale = value.scale();
        let raw = if scale <= SHARE_DECIMALS {
            mantissa
                .checked_mul(pow10(SHARE_DECIMALS - scale))
                .ok_or(RouterError::ArithmeticOverflow)?
        } else {
            mantissa / pow10(scale - SHARE_DECIMALS)
        };
        Ok(Share(raw))
    }

    /// Lossless conversion back to a decimal, when the raw value fits
    pub fn to_decimal(&self) -> Option<Decimal> {
        let raw = u128::try_from(self.0).ok()?;
        let raw = i128::try_from(raw).ok()?;
        Decimal::try_from_i128_with_scale(raw, SHARE_DECIMALS)
            .ok()
            .map(|d| d.normalize())
    }

    pub fn is_valid(&self) -> bool {
        self.0 <= SHARE_SCALE
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// floor(amount * share / 1e18)
    pub fn apply(&self, amount: U256) -> Result<U256, RouterError> {
        let scaled = amount
            .checked_mul(self.0)
            .ok_or(RouterError::ArithmeticOverflow)?;
        Ok(scaled / SHARE_SCALE)
    }
}

impl fmt::Display for Share {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_decimal() {
            Some(d) => write!(f, "{}", d),
            None => write!(f, "{}e-18", self.0),
        }
    }
}

fn pow10(exp: u32) -> U256 {
    let ten = U256::from(10u64);
    (0..exp).fold(U256::from(1u64), |acc, _| acc * ten)
}

/// Share of the trade and who receives it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FeeDescriptor {
    pub share: Share,
    pub beneficiary: Address,
}

impl FeeDescriptor {
    pub fn new(share: Share, beneficiary: Address) -> Self {
        Self { share, beneficiary }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// Result of splitting a gross amount into fees and the executor's net
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    pub protocol_fee: U256,
    pub marketplace_fee: U256,
    pub net: U256,
}

/// Stateless fee math
pub struct FeeEngine;

impl FeeEngine {
    pub fn validate(descriptor: &FeeDescriptor) -> Result<(), RouterError> {
        if !descriptor.share.is_valid() {
            return Err(RouterError::InvalidFee(format!(
                "share {} for {} exceeds 100%",
                descriptor.share, descriptor.beneficiary
            )));
        }
        Ok(())
    }

    /// Each share and their sum must be at most 100%
    pub fn validate_pair(
        protocol_fee: &FeeDescriptor,
        marketplace_fee: &FeeDescriptor,
    ) -> Result<(), RouterError> {
        Self::validate(protocol_fee)?;
        Self::validate(marketplace_fee)?;

        let combined = protocol_fee.share.raw() + marketplace_fee.share.raw();
        if combined > SHARE_SCALE {
            return Err(RouterError::InvalidFee(format!(
                "combined share {} exceeds 100%",
                Share::from_raw(combined)
            )));
        }
        Ok(())
    }

    pub fn compute_fee(amount: U256, descriptor: &FeeDescriptor) -> Result<U256, RouterError> {
        descriptor.share.apply(amount)
    }

    pub fn split(
        amount: U256,
        protocol_fee: &FeeDescriptor,
        marketplace_fee: &FeeDescriptor,
    ) -> Result<FeeSplit, RouterError> {
        let protocol = Self::compute_fee(amount, protocol_fee)?;
        let marketplace = Self::compute_fee(amount, marketplace_fee)?;
        let net = amount
            .checked_sub(protocol)
            .and_then(|rest| rest.checked_sub(marketplace))
            .ok_or(RouterError::ArithmeticOverflow)?;

        Ok(FeeSplit {
            protocol_fee: protocol,
            marketplace_fee: marketplace,
            net,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn percent(p: Decimal) -> FeeDescriptor {
        FeeDescriptor::new(Share::from_decimal(p).unwrap(), Address::repeat_byte(0xfe))
    }

    #[test]
    fn test_share_from_decimal() {
        assert_eq!(
            Share::from_decimal(dec!(0.01)).unwrap().raw(),
            U256::from(10_000_000_000_000_000u64)
        );
        assert_eq!(Share::from_decimal(dec!(1)).unwrap(), Share::ONE);
        assert_eq!(Share::from_decimal(dec!(0)).unwrap(), Share::ZERO);
        assert_eq!(Share::from_decimal(dec!(0.0000000000000000015)).unwrap().raw(), U256::from(1));
    }

    #[test]
    fn test_share_from_decimal_rejects_out_of_range() {
        assert!(matches!(
            Share::from_decimal(dec!(1.0001)),
            Err(RouterError::InvalidFee(_))
        ));
        assert!(matches!(
            Share::from_decimal(dec!(-0.01)),
            Err(RouterError::InvalidFee(_))
        ));
    }

    #[test]
    fn test_share_display() {
        assert_eq!(Share::from_decimal(dec!(0.025)).unwrap().to_string(), "0.025");
        assert_eq!(Share::ONE.to_string(), "1");
    }

    #[test]
    fn test_compute_fee_floors() {
        let fee = percent(dec!(0.01));
        assert_eq!(FeeEngine::compute_fee(U256::from(1000), &fee).unwrap(), U256::from(10));
        // 99 * 1% = 0.99, floored
        assert_eq!(FeeEngine::compute_fee(U256::from(99), &fee).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_split_sums_to_amount() {
        let protocol = percent(dec!(0.01));
        let marketplace = percent(dec!(0.0125));

        for amount in [1u64, 7, 999, 1_000_000_007, 1_000_000_000_000_000_000] {
            let amount = U256::from(amount);
            let split = FeeEngine::split(amount, &protocol, &marketplace).unwrap();
            assert_eq!(split.protocol_fee + split.marketplace_fee + split.net, amount);
        }
    }

    #[test]
    fn test_split_full_share_leaves_zero_net() {
        let split = FeeEngine::split(U256::from(500), &percent(dec!(1)), &FeeDescriptor::none()).unwrap();
        assert_eq!(split.protocol_fee, U256::from(500));
        assert_eq!(split.net, U256::ZERO);
    }

    #[test]
    fn test_validate_pair_combined_limit() {
        assert!(FeeEngine::validate_pair(&percent(dec!(0.6)), &percent(dec!(0.4))).is_ok());
        assert!(matches!(
            FeeEngine::validate_pair(&percent(dec!(0.6)), &percent(dec!(0.41))),
            Err(RouterError::InvalidFee(_))
        ));

        let oversized = FeeDescriptor::new(
            Share::from_raw(SHARE_SCALE + U256::from(1)),
            Address::ZERO,
        );
        assert!(matches!(
            FeeEngine::validate_pair(&oversized, &FeeDescriptor::none()),
            Err(RouterError::InvalidFee(_))
        ));
    }

    #[test]
    fn test_apply_overflow() {
        assert_eq!(
            Share::ONE.apply(U256::MAX),
            Err(RouterError::ArithmeticOverflow)
        );
    }
}
