//! EIP-712 Typed Messages
//!
//! The three structures a signer can put their key to: a trader's approval of
//! one exact trade, the fee signer's approval of one trade's fee terms, and a
//! token owner's single-use permit for the router to pull funds.
//!
//! Created: 2026-10-15

use alloy::primitives::{keccak256, Address, B256, U256};
use alloy::sol;
use alloy::sol_types::{sol_data, SolType};

use crate::fees::FeeDescriptor;
use crate::types::{SwapDescription, TradeInput, TradeOutput};

// ── Typed data ───────────────────────────────────────────────────────

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct TradeAuthorization {
        address trader;
        address inputAsset;
        uint256 inputAmount;
        uint8 amountType;
        uint8 mode;
        address outputAsset;
        uint256 outputBound;
        bytes32 swapHash;
        uint256 salt;
    }
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct FeeAuthorization {
        bytes32 tradeHash;
        uint256 protocolFeeShare;
        address protocolFeeBeneficiary;
        uint256 marketplaceFeeShare;
        address marketplaceFeeBeneficiary;
        uint256 deadline;
    }
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct TradePermit {
        address owner;
        address spender;
        address token;
        uint256 value;
        uint256 nonce;
        uint256 deadline;
    }
}

// ── Hash helpers ─────────────────────────────────────────────────────

type SwapFields = (
    sol_data::Uint<8>,
    sol_data::Uint<256>,
    sol_data::Address,
    sol_data::Uint<256>,
    sol_data::Address,
    sol_data::Address,
    sol_data::Address,
    sol_data::FixedBytes<32>,
);

type TradeFields = (
    sol_data::Address,
    sol_data::Address,
    sol_data::Uint<256>,
    sol_data::Uint<8>,
    sol_data::Uint<8>,
    sol_data::Address,
    sol_data::Uint<256>,
    sol_data::Address,
    sol_data::FixedBytes<32>,
);

/// Swap description including both fee descriptors, as the trader saw it
pub fn swap_hash(swap: &SwapDescription) -> B256 {
    keccak256(SwapFields::abi_encode(&(
        swap.mode.as_u8(),
        swap.protocol_fee.share.raw(),
        swap.protocol_fee.beneficiary,
        swap.marketplace_fee.share.raw(),
        swap.marketplace_fee.beneficiary,
        swap.trader,
        swap.executor,
        keccak256(&swap.payload),
    )))
}

/// The trade without its fee terms; the fee signer binds fees to this
pub fn trade_hash(input: &TradeInput, output: &TradeOutput, swap: &SwapDescription) -> B256 {
    keccak256(TradeFields::abi_encode(&(
        swap.trader,
        input.asset.address(),
        input.amount,
        input.amount_type.as_u8(),
        input.amount_mode.as_u8(),
        output.asset.address(),
        output.bound_amount,
        swap.executor,
        keccak256(&swap.payload),
    )))
}

impl TradeAuthorization {
    pub fn for_trade(
        input: &TradeInput,
        output: &TradeOutput,
        swap: &SwapDescription,
        salt: U256,
    ) -> Self {
        Self {
            trader: swap.trader,
            inputAsset: input.asset.address(),
            inputAmount: input.amount,
            amountType: input.amount_type.as_u8(),
            mode: input.amount_mode.as_u8(),
            outputAsset: output.asset.address(),
            outputBound: output.bound_amount,
            swapHash: swap_hash(swap),
            salt,
        }
    }
}

impl FeeAuthorization {
    pub fn for_trade(
        input: &TradeInput,
        output: &TradeOutput,
        swap: &SwapDescription,
        deadline: U256,
    ) -> Self {
        Self::new(
            trade_hash(input, output, swap),
            &swap.protocol_fee,
            &swap.marketplace_fee,
            deadline,
        )
    }

    fn new(
        trade_hash: B256,
        protocol_fee: &FeeDescriptor,
        marketplace_fee: &FeeDescriptor,
        deadline: U256,
    ) -> Self {
        Self {
            tradeHash: trade_hash,
            protocolFeeShare: protocol_fee.share.raw(),
            protocolFeeBeneficiary: protocol_fee.beneficiary,
            marketplaceFeeShare: marketplace_fee.share.raw(),
            marketplaceFeeBeneficiary: marketplace_fee.beneficiary,
            deadline,
        }
    }
}

// ── Nonce keys ───────────────────────────────────────────────────────
//
// All signed authorizations share one used-nonce set per signer; the scope
// byte keeps a salt, a permit nonce and a fee digest from colliding.

const SCOPE_ACCOUNT: u8 = 1;
const SCOPE_PERMIT: u8 = 2;
const SCOPE_FEE: u8 = 3;

pub fn account_nonce_key(salt: U256) -> B256 {
    keccak256(<(sol_data::Uint<8>, sol_data::Uint<256>)>::abi_encode(&(SCOPE_ACCOUNT, salt)))
}

pub fn permit_nonce_key(token: Address, nonce: U256) -> B256 {
    keccak256(
        <(sol_data::Uint<8>, sol_data::Address, sol_data::Uint<256>)>::abi_encode(&(
            SCOPE_PERMIT,
            token,
            nonce,
        )),
    )
}

pub fn fee_nonce_key(digest: B256) -> B256 {
    keccak256(<(sol_data::Uint<8>, sol_data::FixedBytes<32>)>::abi_encode(&(SCOPE_FEE, digest)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::Share;
    use crate::types::{AmountMode, Asset};
    use alloy::primitives::Bytes;

    fn sample() -> (TradeInput, TradeOutput, SwapDescription) {
        let input = TradeInput::absolute(Asset::Native, U256::from(1_000), AmountMode::FixedInput);
        let output = TradeOutput::new(Asset::Token(Address::repeat_byte(0x11)), U256::from(5));
        let swap = SwapDescription {
            mode: AmountMode::FixedInput,
            protocol_fee: FeeDescriptor::new(Share::from_raw(U256::from(7)), Address::repeat_byte(0xaa)),
            marketplace_fee: FeeDescriptor::none(),
            trader: Address::repeat_byte(0x01),
            executor: Address::repeat_byte(0x02),
            payload: Bytes::from(vec![1u8, 2, 3]),
        };
        (input, output, swap)
    }

    #[test]
    fn test_trade_hash_ignores_fees() {
        let (input, output, mut swap) = sample();
        let before = trade_hash(&input, &output, &swap);
        let swap_before = swap_hash(&swap);

        swap.protocol_fee.share = Share::ONE;
        assert_eq!(trade_hash(&input, &output, &swap), before);
        assert_ne!(swap_hash(&swap), swap_before);
    }

    #[test]
    fn test_trade_hash_binds_payload() {
        let (input, output, mut swap) = sample();
        let before = trade_hash(&input, &output, &swap);
        swap.payload = Bytes::from(vec![9u8]);
        assert_ne!(trade_hash(&input, &output, &swap), before);
    }

    #[test]
    fn test_nonce_key_scopes_differ() {
        let value = U256::from(42);
        assert_ne!(account_nonce_key(value), permit_nonce_key(Address::ZERO, value));
        assert_ne!(account_nonce_key(value), fee_nonce_key(B256::from(value.to_be_bytes::<32>())));
    }
}
