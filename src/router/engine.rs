//! Router Engine
//!
//! Orchestrates one trade end to end: validate, withhold fees, delegate the
//! conversion to a registered executor, enforce bounds, settle. The ledger is
//! locked for the whole call and checkpointed on entry; any error reverts it.
//!
//! Created: 2026-10-15

use alloy::primitives::{Address, U256};
use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use super::settings::RouterSettings;
use super::validation;
use crate::auth::messages::account_nonce_key;
use crate::auth::{AccountSignature, AuthorizationMode, AuthorizationVerifier, FeeSignature};
use crate::errors::{AuthFailure, RouterError};
use crate::executor::{ExecutionContext, SwapExecutor, SwapRequest};
use crate::fees::{FeeDescriptor, FeeEngine};
use crate::ledger::Ledger;
use crate::types::{
    AmountMode, Asset, CallContext, ExecutionReceipt, SwapDescription, TradeInput, TradeOutput,
};

/// Everything a single trade needs after validation
struct ValidatedTrade<'a> {
    amount: U256,
    protocol_fee: FeeDescriptor,
    marketplace_fee: FeeDescriptor,
    executor: Arc<dyn SwapExecutor>,
    request: SwapRequest<'a>,
}

pub struct Router {
    settings: RwLock<RouterSettings>,
    verifier: AuthorizationVerifier,
    executors: DashMap<Address, Arc<dyn SwapExecutor>>,
    ledger: Arc<Mutex<Ledger>>,
}

impl Router {
    pub fn new(settings: RouterSettings, ledger: Arc<Mutex<Ledger>>) -> Result<Self, RouterError> {
        settings.validate()?;
        let verifier = AuthorizationVerifier::new(
            &settings.domain_name,
            &settings.domain_version,
            settings.chain_id,
            settings.address,
        );

        info!(
            router = %settings.address,
            owner = %settings.owner,
            chain_id = settings.chain_id,
            protocol_fee = %settings.protocol_fee_default.share,
            "router initialized"
        );

        Ok(Self {
            settings: RwLock::new(settings),
            verifier,
            executors: DashMap::new(),
            ledger,
        })
    }

    /// Register an executor at construction time
    pub fn with_executor(self, id: Address, executor: Arc<dyn SwapExecutor>) -> Self {
        self.executors.insert(id, executor);
        self
    }

    pub fn verifier(&self) -> &AuthorizationVerifier {
        &self.verifier
    }

    pub fn ledger(&self) -> Arc<Mutex<Ledger>> {
        Arc::clone(&self.ledger)
    }

    pub fn settings(&self) -> Result<RouterSettings, RouterError> {
        self.settings
            .read()
            .map(|s| s.clone())
            .map_err(|_| RouterError::StateUnavailable)
    }

    pub fn address(&self) -> Result<Address, RouterError> {
        Ok(self.settings()?.address)
    }

    // ── Trading ──────────────────────────────────────────────────────

    /// Execute a trade atomically, returning the realized settlement
    pub fn execute(
        &self,
        ctx: &CallContext,
        input: &TradeInput,
        output: &TradeOutput,
        swap: &SwapDescription,
        account_sig: Option<&AccountSignature>,
        fee_sig: Option<&FeeSignature>,
    ) -> Result<ExecutionReceipt, RouterError> {
        self.run(ctx, input, output, swap, account_sig, fee_sig, true)
    }

    /// Run a trade and always revert it; returns the receipt `execute` would produce
    pub fn simulate(
        &self,
        ctx: &CallContext,
        input: &TradeInput,
        output: &TradeOutput,
        swap: &SwapDescription,
        account_sig: Option<&AccountSignature>,
        fee_sig: Option<&FeeSignature>,
    ) -> Result<ExecutionReceipt, RouterError> {
        self.run(ctx, input, output, swap, account_sig, fee_sig, false)
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        ctx: &CallContext,
        input: &TradeInput,
        output: &TradeOutput,
        swap: &SwapDescription,
        account_sig: Option<&AccountSignature>,
        fee_sig: Option<&FeeSignature>,
        commit: bool,
    ) -> Result<ExecutionReceipt, RouterError> {
        let settings = self.settings()?;
        let mut ledger = self.lock_ledger()?;
        let checkpoint = ledger.checkpoint();

        let result = self.execute_in(
            &mut ledger,
            &settings,
            ctx,
            input,
            output,
            swap,
            account_sig,
            fee_sig,
        );

        match result {
            Ok(receipt) => {
                if commit {
                    ledger.commit(checkpoint);
                    info!(
                        trader = %receipt.trader,
                        mode = %receipt.mode,
                        input = %receipt.input_asset,
                        output = %receipt.output_asset,
                        spent = %receipt.input_spent,
                        received = %receipt.output_delivered,
                        protocol_fee = %receipt.protocol_fee_amount,
                        marketplace_fee = %receipt.marketplace_fee_amount,
                        refunded = %receipt.refunded,
                        "trade settled"
                    );
                } else {
                    ledger.revert_to(checkpoint);
                    debug!(trader = %receipt.trader, realized = %receipt.realized(), "trade simulated");
                }
                Ok(receipt)
            }
            Err(err) => {
                ledger.revert_to(checkpoint);
                warn!(
                    trader = %swap.trader,
                    sender = %ctx.sender,
                    executor = %swap.executor,
                    error = %err,
                    "trade rejected"
                );
                Err(err)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn execute_in(
        &self,
        ledger: &mut Ledger,
        settings: &RouterSettings,
        ctx: &CallContext,
        input: &TradeInput,
        output: &TradeOutput,
        swap: &SwapDescription,
        account_sig: Option<&AccountSignature>,
        fee_sig: Option<&FeeSignature>,
    ) -> Result<ExecutionReceipt, RouterError> {
        let trade = self.validate(ledger, settings, ctx, input, output, swap, account_sig, fee_sig)?;
        self.pull_input(ledger, settings.address, ctx, input, swap, trade.amount)?;

        match swap.mode {
            AmountMode::FixedInput => self.settle_fixed_input(ledger, settings.address, output, swap, &trade),
            AmountMode::FixedOutput => self.settle_fixed_output(ledger, settings.address, output, swap, &trade),
        }
    }

    /// All checks before funds move; nonce burns and permit approvals are journaled
    #[allow(clippy::too_many_arguments)]
    fn validate<'a>(
        &self,
        ledger: &mut Ledger,
        settings: &RouterSettings,
        ctx: &CallContext,
        input: &TradeInput,
        output: &TradeOutput,
        swap: &'a SwapDescription,
        account_sig: Option<&AccountSignature>,
        fee_sig: Option<&FeeSignature>,
    ) -> Result<ValidatedTrade<'a>, RouterError> {
        validation::check_mode(input, swap)?;
        let amount = validation::resolve_amount(ledger, input, swap)?;
        validation::check_degenerate(swap.mode, amount, output)?;
        validation::check_distinct_assets(input.asset, output.asset)?;

        // Caller authority
        match account_sig {
            None if ctx.sender != swap.trader => {
                return Err(AuthFailure::CallerNotTrader {
                    sender: ctx.sender,
                    trader: swap.trader,
                }
                .into());
            }
            None => {}
            Some(signature) => {
                self.verifier
                    .verify_account_signature(ledger, input, output, swap, signature)?;
            }
        }

        // Fee authority
        let protocol_fee = match fee_sig {
            Some(signature) => {
                self.verifier.verify_fee_signature(
                    ledger,
                    settings.fee_signer,
                    ctx.timestamp,
                    input,
                    output,
                    swap,
                    signature,
                )?;
                swap.protocol_fee
            }
            None => settings.protocol_fee_default,
        };
        let marketplace_fee = swap.marketplace_fee;
        FeeEngine::validate_pair(&protocol_fee, &marketplace_fee)?;

        // Executor and payload
        let executor = self
            .executors
            .get(&swap.executor)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(RouterError::UnknownExecutor(swap.executor))?;
        let request = SwapRequest {
            mode: swap.mode,
            input: input.asset,
            output: output.asset,
            payload: &swap.payload,
        };
        executor.validate(ledger, &request)?;

        // Funding authority
        validation::check_call_value(input.asset, amount, ctx.value)?;
        if let Asset::Token(token) = input.asset {
            match AuthorizationMode::resolve(input)? {
                AuthorizationMode::PermitSigned(permit) => {
                    self.verifier
                        .verify_permit(ledger, swap.trader, token, &permit, ctx.timestamp)?;
                    if permit.value < amount {
                        return Err(RouterError::InsufficientAuthorization {
                            required: amount,
                            available: permit.value,
                        });
                    }
                    // Permit semantics: the allowance becomes `permit.value`, whatever it was
                    ledger.approve(token, swap.trader, settings.address, permit.value);
                }
                AuthorizationMode::PreApproved => {
                    let available = ledger.allowance(token, swap.trader, settings.address);
                    if available < amount {
                        return Err(RouterError::InsufficientAuthorization {
                            required: amount,
                            available,
                        });
                    }
                }
            }
        } else {
            AuthorizationMode::resolve(input)?;
        }

        Ok(ValidatedTrade {
            amount,
            protocol_fee,
            marketplace_fee,
            executor,
            request,
        })
    }

    fn pull_input(
        &self,
        ledger: &mut Ledger,
        router: Address,
        ctx: &CallContext,
        input: &TradeInput,
        swap: &SwapDescription,
        amount: U256,
    ) -> Result<(), RouterError> {
        match input.asset {
            // The call value is paid by whoever submits the call
            Asset::Native => ledger.transfer(Asset::Native, ctx.sender, router, amount),
            Asset::Token(token) => ledger.transfer_from(token, swap.trader, router, router, amount),
        }
    }

    fn settle_fixed_input(
        &self,
        ledger: &mut Ledger,
        router: Address,
        output: &TradeOutput,
        swap: &SwapDescription,
        trade: &ValidatedTrade<'_>,
    ) -> Result<ExecutionReceipt, RouterError> {
        let input_asset = trade.request.input;
        let split = FeeEngine::split(trade.amount, &trade.protocol_fee, &trade.marketplace_fee)?;
        if split.net.is_zero() {
            return Err(RouterError::DegenerateTrade("nothing left to swap after fees"));
        }

        pay_fee(ledger, input_asset, router, &trade.protocol_fee, split.protocol_fee)?;
        pay_fee(ledger, input_asset, router, &trade.marketplace_fee, split.marketplace_fee)?;

        let before = ledger.balance_of(output.asset, router);
        let reported = {
            let mut ctx = ExecutionContext::new(ledger, router);
            trade
                .executor
                .execute_fixed_input(&mut ctx, &trade.request, split.net)?
        };
        let realized = ledger.balance_of(output.asset, router).saturating_sub(before);
        debug!(
            executor = trade.executor.name(),
            reported = %reported,
            realized = %realized,
            "executor returned"
        );

        if realized < output.bound_amount {
            return Err(RouterError::SlippageExceeded {
                bound: output.bound_amount,
                actual: realized,
            });
        }
        ledger.transfer(output.asset, router, swap.trader, realized)?;

        Ok(ExecutionReceipt {
            mode: AmountMode::FixedInput,
            trader: swap.trader,
            input_asset,
            output_asset: output.asset,
            input_spent: trade.amount,
            swapped: split.net,
            output_delivered: realized,
            protocol_fee_amount: split.protocol_fee,
            marketplace_fee_amount: split.marketplace_fee,
            refunded: U256::ZERO,
        })
    }

    fn settle_fixed_output(
        &self,
        ledger: &mut Ledger,
        router: Address,
        output: &TradeOutput,
        swap: &SwapDescription,
        trade: &ValidatedTrade<'_>,
    ) -> Result<ExecutionReceipt, RouterError> {
        let input_asset = trade.request.input;
        let ceiling = trade.amount;
        let net_ceiling =
            FeeEngine::split(ceiling, &trade.protocol_fee, &trade.marketplace_fee)?.net;
        if net_ceiling.is_zero() {
            return Err(RouterError::DegenerateTrade("nothing left to swap after fees"));
        }

        let input_before = ledger.balance_of(input_asset, router);
        let output_before = ledger.balance_of(output.asset, router);
        let reported = {
            let mut ctx = ExecutionContext::new(ledger, router);
            trade.executor.execute_fixed_output(
                &mut ctx,
                &trade.request,
                output.bound_amount,
                net_ceiling,
            )?
        };
        let spent = input_before.saturating_sub(ledger.balance_of(input_asset, router));
        let received = ledger
            .balance_of(output.asset, router)
            .saturating_sub(output_before);
        debug!(
            executor = trade.executor.name(),
            reported = %reported,
            spent = %spent,
            received = %received,
            "executor returned"
        );

        // Surplus output would have nowhere to go; the trader gets exactly the bound
        if received != output.bound_amount {
            return Err(RouterError::SlippageExceeded {
                bound: output.bound_amount,
                actual: received,
            });
        }

        // Fees are charged on what was actually spent, not on the ceiling
        let protocol_fee = FeeEngine::compute_fee(spent, &trade.protocol_fee)?;
        let marketplace_fee = FeeEngine::compute_fee(spent, &trade.marketplace_fee)?;
        let total = spent
            .checked_add(protocol_fee)
            .and_then(|t| t.checked_add(marketplace_fee))
            .ok_or(RouterError::ArithmeticOverflow)?;
        if total > ceiling {
            return Err(RouterError::SlippageExceeded {
                bound: ceiling,
                actual: total,
            });
        }

        pay_fee(ledger, input_asset, router, &trade.protocol_fee, protocol_fee)?;
        pay_fee(ledger, input_asset, router, &trade.marketplace_fee, marketplace_fee)?;

        let refunded = ceiling - total;
        ledger.transfer(input_asset, router, swap.trader, refunded)?;
        ledger.transfer(output.asset, router, swap.trader, output.bound_amount)?;

        Ok(ExecutionReceipt {
            mode: AmountMode::FixedOutput,
            trader: swap.trader,
            input_asset,
            output_asset: output.asset,
            input_spent: total,
            swapped: spent,
            output_delivered: output.bound_amount,
            protocol_fee_amount: protocol_fee,
            marketplace_fee_amount: marketplace_fee,
            refunded,
        })
    }

    // ── Operator surface ─────────────────────────────────────────────

    pub fn set_protocol_fee_default(
        &self,
        ctx: &CallContext,
        fee: FeeDescriptor,
    ) -> Result<(), RouterError> {
        FeeEngine::validate(&fee)?;
        let mut settings = self.write_settings()?;
        settings.ensure_owner(ctx.sender)?;
        settings.protocol_fee_default = fee;
        info!(share = %fee.share, beneficiary = %fee.beneficiary, "protocol fee default updated");
        Ok(())
    }

    pub fn set_protocol_fee_signer(
        &self,
        ctx: &CallContext,
        signer: Option<Address>,
    ) -> Result<(), RouterError> {
        let mut settings = self.write_settings()?;
        settings.ensure_owner(ctx.sender)?;
        settings.fee_signer = signer;
        info!(signer = ?signer, "protocol fee signer updated");
        Ok(())
    }

    pub fn transfer_ownership(&self, ctx: &CallContext, new_owner: Address) -> Result<(), RouterError> {
        let mut settings = self.write_settings()?;
        settings.ensure_owner(ctx.sender)?;
        let previous = settings.owner;
        settings.owner = new_owner;
        info!(previous = %previous, owner = %new_owner, "ownership transferred");
        Ok(())
    }

    /// Sweep whatever the router holds of `asset` to `beneficiary`
    pub fn return_lost_tokens(
        &self,
        ctx: &CallContext,
        asset: Asset,
        beneficiary: Address,
    ) -> Result<U256, RouterError> {
        let settings = self.settings()?;
        settings.ensure_owner(ctx.sender)?;

        let mut ledger = self.lock_ledger()?;
        let amount = ledger.balance_of(asset, settings.address);
        ledger.transfer(asset, settings.address, beneficiary, amount)?;
        info!(asset = %asset, beneficiary = %beneficiary, amount = %amount, "lost tokens returned");
        Ok(amount)
    }

    pub fn register_executor(
        &self,
        ctx: &CallContext,
        id: Address,
        executor: Arc<dyn SwapExecutor>,
    ) -> Result<(), RouterError> {
        self.settings()?.ensure_owner(ctx.sender)?;
        let name = executor.name().to_string();
        self.executors.insert(id, executor);
        info!(id = %id, executor = %name, "swap executor registered");
        Ok(())
    }

    /// Burn one of the caller's own account-signature salts
    pub fn cancel_account_signature(&self, ctx: &CallContext, salt: U256) -> Result<(), RouterError> {
        let mut ledger = self.lock_ledger()?;
        ledger.consume_nonce(ctx.sender, account_nonce_key(salt))?;
        info!(account = %ctx.sender, salt = %salt, "account signature cancelled");
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn lock_ledger(&self) -> Result<MutexGuard<'_, Ledger>, RouterError> {
        self.ledger.lock().map_err(|_| RouterError::StateUnavailable)
    }

    fn write_settings(&self) -> Result<std::sync::RwLockWriteGuard<'_, RouterSettings>, RouterError> {
        self.settings.write().map_err(|_| RouterError::StateUnavailable)
    }
}

fn pay_fee(
    ledger: &mut Ledger,
    asset: Asset,
    router: Address,
    descriptor: &FeeDescriptor,
    amount: U256,
) -> Result<(), RouterError> {
    if amount.is_zero() {
        return Ok(());
    }
    ledger.transfer(asset, router, descriptor.beneficiary, amount)?;
    debug!(asset = %asset, beneficiary = %descriptor.beneficiary, amount = %amount, "fee paid");
    Ok(())
}
