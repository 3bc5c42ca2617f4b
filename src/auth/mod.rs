//! Signed Authorizations
//!
//! Three independent signatures can accompany a trade:
//! - `Permit`: token owner lets the router pull funds without a prior approval
//! - `AccountSignature`: trader authorizes this exact trade for any submitter
//! - `FeeSignature`: protocol fee signer authorizes this trade's fee terms
//!
//! Absent signatures are `None` and never reach the verifier.
//!
//! Created: 2026-10-15

pub mod messages;
pub mod verifier;

pub use verifier::{recover_signer, AuthorizationVerifier};

use alloy::primitives::{Bytes, U256};

use crate::errors::RouterError;
use crate::types::TradeInput;

/// Owner-signed single-use allowance for the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permit {
    /// Maximum amount the router may pull
    pub value: U256,
    pub nonce: U256,
    pub deadline: U256,
    pub signature: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSignature {
    pub salt: U256,
    pub signature: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeSignature {
    pub deadline: U256,
    pub signature: Bytes,
}

/// How the router is entitled to pull the trader's input, decided once at entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationMode {
    /// An allowance already exists (or the input is native value attached to the call)
    PreApproved,
    PermitSigned(Permit),
}

impl AuthorizationMode {
    pub fn resolve(input: &TradeInput) -> Result<Self, RouterError> {
        match &input.permit {
            None => Ok(AuthorizationMode::PreApproved),
            Some(_) if input.asset.is_native() => {
                Err(RouterError::DegenerateTrade("permit supplied for native input"))
            }
            Some(permit) => Ok(AuthorizationMode::PermitSigned(permit.clone())),
        }
    }
}

/// Sign an EIP-712 digest the way a wallet would
#[cfg(test)]
pub(crate) fn sign_digest(
    signer: &alloy::signers::local::PrivateKeySigner,
    digest: alloy::primitives::B256,
) -> Bytes {
    use alloy::signers::SignerSync;

    let signature = signer
        .sign_hash_sync(&digest)
        .expect("local signing cannot fail");
    Bytes::from(signature.as_bytes().to_vec())
}
