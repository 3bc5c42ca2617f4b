//! Router settings
//!
//! Process-wide configuration owned by the router. Only the owner may change
//! the fee default, the fee signer or ownership itself.

use alloy::primitives::Address;

use crate::errors::RouterError;
use crate::fees::{FeeDescriptor, FeeEngine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterSettings {
    /// Router's own address: holds funds mid-trade, EIP-712 verifying contract
    pub address: Address,
    pub owner: Address,
    pub wrapped_native: Address,
    pub chain_id: u64,
    pub domain_name: String,
    pub domain_version: String,
    /// Applied to every trade without a fee signature
    pub protocol_fee_default: FeeDescriptor,
    pub fee_signer: Option<Address>,
}

impl RouterSettings {
    pub fn new(address: Address, owner: Address, wrapped_native: Address) -> Self {
        Self {
            address,
            owner,
            wrapped_native,
            chain_id: 1,
            domain_name: "TradeRouter".to_string(),
            domain_version: "1".to_string(),
            protocol_fee_default: FeeDescriptor::none(),
            fee_signer: None,
        }
    }

    pub fn with_protocol_fee_default(mut self, fee: FeeDescriptor) -> Self {
        self.protocol_fee_default = fee;
        self
    }

    pub fn with_fee_signer(mut self, signer: Address) -> Self {
        self.fee_signer = Some(signer);
        self
    }

    pub fn validate(&self) -> Result<(), RouterError> {
        FeeEngine::validate(&self.protocol_fee_default)
    }

    pub fn ensure_owner(&self, caller: Address) -> Result<(), RouterError> {
        if caller != self.owner {
            return Err(RouterError::Unauthorized(caller));
        }
        Ok(())
    }
}
