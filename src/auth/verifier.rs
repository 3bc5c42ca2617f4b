//! Authorization Verifier
//!
//! Recovers secp256k1 signers from EIP-712 digests bound to the router's
//! domain `{name, version, chainId, verifyingContract = router}` and burns the
//! matching nonce in the ledger. Nonce consumption is journaled, so a trade
//! that fails later gives the nonce back.
//!
//! Created: 2026-10-15

use alloy::primitives::{Address, Signature, B256, U256};
use alloy::sol_types::{Eip712Domain, SolStruct};
use tracing::debug;

use super::messages::{
    account_nonce_key, fee_nonce_key, permit_nonce_key, FeeAuthorization, TradeAuthorization,
    TradePermit,
};
use super::{AccountSignature, FeeSignature, Permit};
use crate::errors::{AuthFailure, RouterError};
use crate::ledger::Ledger;
use crate::types::{SwapDescription, TradeInput, TradeOutput};

#[derive(Debug, Clone)]
pub struct AuthorizationVerifier {
    domain: Eip712Domain,
}

impl AuthorizationVerifier {
    pub fn new(name: &str, version: &str, chain_id: u64, router: Address) -> Self {
        let domain = Eip712Domain::new(
            Some(name.to_string().into()),
            Some(version.to_string().into()),
            Some(U256::from(chain_id)),
            Some(router),
            None,
        );
        Self { domain }
    }

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    pub fn account_digest(
        &self,
        input: &TradeInput,
        output: &TradeOutput,
        swap: &SwapDescription,
        salt: U256,
    ) -> B256 {
        TradeAuthorization::for_trade(input, output, swap, salt).eip712_signing_hash(&self.domain)
    }

    pub fn fee_digest(
        &self,
        input: &TradeInput,
        output: &TradeOutput,
        swap: &SwapDescription,
        deadline: U256,
    ) -> B256 {
        FeeAuthorization::for_trade(input, output, swap, deadline).eip712_signing_hash(&self.domain)
    }

    pub fn permit_digest(&self, owner: Address, token: Address, permit: &Permit) -> B256 {
        let spender = self.router();
        TradePermit {
            owner,
            spender,
            token,
            value: permit.value,
            nonce: permit.nonce,
            deadline: permit.deadline,
        }
        .eip712_signing_hash(&self.domain)
    }

    /// Trader approved this exact trade; burns `salt` under the trader
    pub fn verify_account_signature(
        &self,
        ledger: &mut Ledger,
        input: &TradeInput,
        output: &TradeOutput,
        swap: &SwapDescription,
        signature: &AccountSignature,
    ) -> Result<(), RouterError> {
        let digest = self.account_digest(input, output, swap, signature.salt);
        ensure_signer(swap.trader, digest, &signature.signature)?;

        ledger.consume_nonce(swap.trader, account_nonce_key(signature.salt))?;
        debug!(trader = %swap.trader, salt = %signature.salt, "account signature accepted");
        Ok(())
    }

    /// Fee signer approved both fee descriptors of this trade
    pub fn verify_fee_signature(
        &self,
        ledger: &mut Ledger,
        fee_signer: Option<Address>,
        now: u64,
        input: &TradeInput,
        output: &TradeOutput,
        swap: &SwapDescription,
        signature: &FeeSignature,
    ) -> Result<(), RouterError> {
        let signer = fee_signer.ok_or(AuthFailure::NoFeeSigner)?;
        ensure_not_expired(signature.deadline, now)?;

        let digest = self.fee_digest(input, output, swap, signature.deadline);
        ensure_signer(signer, digest, &signature.signature)?;

        ledger.consume_nonce(signer, fee_nonce_key(digest))?;
        debug!(signer = %signer, deadline = %signature.deadline, "fee signature accepted");
        Ok(())
    }

    /// Owner permits the router to pull up to `permit.value` of `token` once
    pub fn verify_permit(
        &self,
        ledger: &mut Ledger,
        owner: Address,
        token: Address,
        permit: &Permit,
        now: u64,
    ) -> Result<(), RouterError> {
        ensure_not_expired(permit.deadline, now)?;

        let digest = self.permit_digest(owner, token, permit);
        ensure_signer(owner, digest, &permit.signature)?;

        ledger.consume_nonce(owner, permit_nonce_key(token, permit.nonce))?;
        debug!(owner = %owner, token = %token, nonce = %permit.nonce, "permit accepted");
        Ok(())
    }

    fn router(&self) -> Address {
        self.domain.verifying_contract.unwrap_or_default()
    }
}

fn ensure_not_expired(deadline: U256, now: u64) -> Result<(), AuthFailure> {
    if deadline < U256::from(now) {
        return Err(AuthFailure::Expired { deadline, now });
    }
    Ok(())
}

/// Recover the signer of `digest` from a 65-byte `r || s || v` signature
pub fn recover_signer(digest: B256, signature: &[u8]) -> Result<Address, AuthFailure> {
    if signature.len() != 65 {
        return Err(AuthFailure::InvalidSignature);
    }
    let signature = Signature::from_raw(signature).map_err(|_| AuthFailure::InvalidSignature)?;
    signature
        .recover_address_from_prehash(&digest)
        .map_err(|_| AuthFailure::InvalidSignature)
}

fn ensure_signer(expected: Address, digest: B256, signature: &[u8]) -> Result<(), AuthFailure> {
    let recovered = recover_signer(digest, signature)?;
    if recovered != expected {
        return Err(AuthFailure::WrongSigner { expected, recovered });
    }
    Ok(())
}
