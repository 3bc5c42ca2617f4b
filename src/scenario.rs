//! Scenario runner
//!
//! A scenario is a TOML file that seeds a ledger (balances, allowances,
//! pairs) and lists trades to submit against the router. Each trade yields
//! one serializable outcome line.
//!
//! Created: 2026-10-15

use alloy::primitives::{Address, U256};
use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::executor::UniswapPayload;
use crate::fees::{FeeDescriptor, Share};
use crate::ledger::Ledger;
use crate::router::Router;
use crate::types::{
    AmountMode, AmountType, Asset, CallContext, ExecutionReceipt, SwapDescription, TradeInput,
    TradeOutput,
};
use crate::venues::Pair;

const DEFAULT_DECIMALS: u32 = 18;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub balances: Vec<BalanceEntry>,
    #[serde(default)]
    pub allowances: Vec<AllowanceEntry>,
    #[serde(default)]
    pub pairs: Vec<PairEntry>,
    #[serde(default, rename = "trade")]
    pub trades: Vec<TradeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceEntry {
    pub account: String,
    /// "native" or a token address
    pub asset: String,
    /// Human units, scaled by `decimals`
    pub amount: String,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AllowanceEntry {
    pub token: String,
    pub owner: String,
    /// Defaults to the router
    pub spender: Option<String>,
    /// Human units or "max"
    pub amount: String,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairEntry {
    pub address: String,
    pub token0: String,
    pub token1: String,
    pub reserve0: String,
    pub reserve1: String,
    #[serde(default = "default_decimals")]
    pub decimals0: u32,
    #[serde(default = "default_decimals")]
    pub decimals1: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeEntry {
    pub name: String,
    pub trader: String,
    /// Submitting account; defaults to the trader
    pub sender: Option<String>,
    pub mode: AmountMode,
    #[serde(default = "default_amount_type")]
    pub amount_type: AmountType,
    pub input_asset: String,
    /// Human units, or a decimal share for relative amounts
    pub input_amount: String,
    #[serde(default = "default_decimals")]
    pub input_decimals: u32,
    pub output_asset: String,
    pub output_bound: String,
    #[serde(default = "default_decimals")]
    pub output_decimals: u32,
    pub path: Vec<String>,
    pub directions: Vec<bool>,
    /// Fixed-side amount the route is built for: gross input (fixed input)
    /// or output (fixed output)
    #[serde(default)]
    pub fixed_side_amount: Option<String>,
    pub marketplace_fee_share: Option<String>,
    pub marketplace_fee_beneficiary: Option<String>,
    /// Executor id; defaults to the built-in uniswap caller
    pub executor: Option<String>,
}

fn default_decimals() -> u32 { DEFAULT_DECIMALS }
fn default_amount_type() -> AmountType { AmountType::Absolute }

/// One line of scenario output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_spent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_delivered: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_fee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketplace_fee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refunded: Option<String>,
}

impl TradeOutcome {
    fn settled(name: &str, status: &str, receipt: &ExecutionReceipt) -> Self {
        Self {
            name: name.to_string(),
            status: status.to_string(),
            error: None,
            input_spent: Some(receipt.input_spent.to_string()),
            output_delivered: Some(receipt.output_delivered.to_string()),
            protocol_fee: Some(receipt.protocol_fee_amount.to_string()),
            marketplace_fee: Some(receipt.marketplace_fee_amount.to_string()),
            refunded: Some(receipt.refunded.to_string()),
        }
    }

    fn rejected(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            status: "rejected".to_string(),
            error: Some(error),
            input_spent: None,
            output_delivered: None,
            protocol_fee: None,
            marketplace_fee: None,
            refunded: None,
        }
    }
}

impl Scenario {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read scenario file: {}", path.as_ref().display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML scenario")
    }

    /// Write balances, pairs and allowances into `ledger`
    pub fn seed(&self, ledger: &mut Ledger, router: Address) -> Result<()> {
        for entry in &self.balances {
            let asset = parse_asset(&entry.asset)?;
            let account = parse_address(&entry.account)?;
            let amount = parse_units(&entry.amount, entry.decimals)?;
            ledger.mint(asset, account, amount)?;
        }

        for entry in &self.pairs {
            let address = parse_address(&entry.address)?;
            let token0 = parse_address(&entry.token0)?;
            let token1 = parse_address(&entry.token1)?;
            ledger.mint(Asset::Token(token0), address, parse_units(&entry.reserve0, entry.decimals0)?)?;
            ledger.mint(Asset::Token(token1), address, parse_units(&entry.reserve1, entry.decimals1)?)?;
            ledger.add_pair(Pair::new(address, token0, token1));
        }

        for entry in &self.allowances {
            let spender = match &entry.spender {
                Some(spender) => parse_address(spender)?,
                None => router,
            };
            let amount = if entry.amount.trim().eq_ignore_ascii_case("max") {
                U256::MAX
            } else {
                parse_units(&entry.amount, entry.decimals)?
            };
            ledger.approve(
                parse_address(&entry.token)?,
                parse_address(&entry.owner)?,
                spender,
                amount,
            );
        }

        info!(
            balances = self.balances.len(),
            pairs = self.pairs.len(),
            allowances = self.allowances.len(),
            "scenario seeded"
        );
        Ok(())
    }

    /// Submit every trade in order; `dry_run` simulates instead of settling
    pub fn run(&self, router: &Router, default_executor: Address, dry_run: bool) -> Result<Vec<TradeOutcome>> {
        let mut outcomes = Vec::with_capacity(self.trades.len());

        for trade in &self.trades {
            let request = trade
                .build(default_executor)
                .with_context(|| format!("Invalid trade '{}'", trade.name))?;

            let result = if dry_run {
                router.simulate(&request.ctx, &request.input, &request.output, &request.swap, None, None)
            } else {
                router.execute(&request.ctx, &request.input, &request.output, &request.swap, None, None)
            };

            let outcome = match result {
                Ok(receipt) => {
                    let status = if dry_run { "simulated" } else { "settled" };
                    TradeOutcome::settled(&trade.name, status, &receipt)
                }
                Err(err) => {
                    warn!(trade = %trade.name, error = %err, "scenario trade rejected");
                    TradeOutcome::rejected(&trade.name, err.to_string())
                }
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}

/// A scenario trade turned into router arguments
struct TradeRequest {
    ctx: CallContext,
    input: TradeInput,
    output: TradeOutput,
    swap: SwapDescription,
}

impl TradeEntry {
    fn build(&self, default_executor: Address) -> Result<TradeRequest> {
        let trader = parse_address(&self.trader)?;
        let sender = match &self.sender {
            Some(sender) => parse_address(sender)?,
            None => trader,
        };

        let input_asset = parse_asset(&self.input_asset)?;
        let output_asset = parse_asset(&self.output_asset)?;
        let amount = match self.amount_type {
            AmountType::Absolute => parse_units(&self.input_amount, self.input_decimals)?,
            AmountType::Relative => parse_units(&self.input_amount, DEFAULT_DECIMALS)?,
        };
        let bound = parse_units(&self.output_bound, self.output_decimals)?;

        let fixed_side_decimals = match self.mode {
            AmountMode::FixedInput => self.input_decimals,
            AmountMode::FixedOutput => self.output_decimals,
        };
        let fixed_side_amount = match &self.fixed_side_amount {
            Some(amount) => parse_units(amount, fixed_side_decimals)?,
            None => U256::ZERO,
        };

        let path = self
            .path
            .iter()
            .map(|p| parse_address(p))
            .collect::<Result<Vec<_>>>()?;
        let payload = UniswapPayload {
            path,
            directions: self.directions.clone(),
            mode: self.mode,
            fixed_side_amount,
            unwrap_native: output_asset.is_native(),
        }
        .encode();

        let marketplace_fee = match (&self.marketplace_fee_share, &self.marketplace_fee_beneficiary) {
            (Some(share), Some(beneficiary)) => {
                let share = Decimal::from_str(share.trim())
                    .with_context(|| format!("marketplace_fee_share is not a decimal: {}", share))?;
                FeeDescriptor::new(Share::from_decimal(share)?, parse_address(beneficiary)?)
            }
            (None, None) => FeeDescriptor::none(),
            _ => bail!("marketplace_fee_share and marketplace_fee_beneficiary must be set together"),
        };

        let executor = match &self.executor {
            Some(executor) => parse_address(executor)?,
            None => default_executor,
        };

        let input = TradeInput {
            asset: input_asset,
            amount,
            amount_type: self.amount_type,
            amount_mode: self.mode,
            permit: None,
        };
        let ctx = if input_asset.is_native() {
            CallContext::new(sender).with_value(amount)
        } else {
            CallContext::new(sender)
        };

        Ok(TradeRequest {
            ctx,
            input,
            output: TradeOutput::new(output_asset, bound),
            swap: SwapDescription {
                mode: self.mode,
                // Replaced by the router's default: scenario trades carry no fee signature
                protocol_fee: FeeDescriptor::none(),
                marketplace_fee,
                trader,
                executor,
                payload,
            },
        })
    }
}

fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value.trim()).with_context(|| format!("not an address: {}", value))
}

fn parse_asset(value: &str) -> Result<Asset> {
    Asset::from_str(value).map_err(anyhow::Error::msg)
}

/// "1.5" with 18 decimals -> 1_500_000_000_000_000_000
pub fn parse_units(value: &str, decimals: u32) -> Result<U256> {
    let amount = Decimal::from_str(value.trim())
        .with_context(|| format!("not a decimal amount: {}", value))?;
    if amount.is_sign_negative() {
        bail!("negative amount: {}", value);
    }

    let mantissa = U256::from(amount.mantissa().unsigned_abs());
    let scale = amount.scale();
    if scale > decimals {
        bail!("{} has more than {} decimals", value, decimals);
    }
    let factor = (0..decimals - scale).fold(U256::from(1u64), |acc, _| acc * U256::from(10u64));
    mantissa
        .checked_mul(factor)
        .with_context(|| format!("amount overflows: {}", value))
}
