//! Configuration management
//!
//! Router settings come from a TOML file; `.env` is loaded first so that
//! `ROUTER_OWNER` and `ROUTER_FEE_SIGNER` can override the file.
//!
//! Created: 2026-10-15

use alloy::primitives::Address;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::fees::{FeeDescriptor, Share};
use crate::router::RouterSettings;

/// Top-level TOML configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct RouterFileConfig {
    pub router: RouterSection,
    #[serde(default)]
    pub protocol_fee: Option<ProtocolFeeSection>,
    #[serde(default)]
    pub fee_signer: Option<FeeSignerSection>,
    #[serde(default)]
    pub executors: ExecutorsSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouterSection {
    pub address: String,
    pub owner: String,
    pub wrapped_native: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_domain_name")]
    pub domain_name: String,
    #[serde(default = "default_domain_version")]
    pub domain_version: String,
}

/// Protocol fee default; `share` is a decimal fraction ("0.01" = 1%)
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolFeeSection {
    pub share: String,
    pub beneficiary: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeeSignerSection {
    pub address: String,
}

/// Identifiers the built-in executors are registered under
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorsSection {
    #[serde(default = "default_uniswap_caller")]
    pub uniswap_caller: String,
}

impl Default for ExecutorsSection {
    fn default() -> Self {
        Self {
            uniswap_caller: default_uniswap_caller(),
        }
    }
}

fn default_chain_id() -> u64 { 1 }
fn default_domain_name() -> String { "TradeRouter".to_string() }
fn default_domain_version() -> String { "1".to_string() }
fn default_uniswap_caller() -> String { "0x0000000000000000000000000000000000000c01".to_string() }

/// Resolved, strongly typed configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: RouterSettings,
    pub uniswap_caller: Address,
}

impl RouterFileConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML configuration")
    }

    /// Replace owner and fee signer with values from the environment, when set
    pub fn apply_overrides(&mut self, owner: Option<String>, fee_signer: Option<String>) {
        if let Some(owner) = owner {
            self.router.owner = owner;
        }
        if let Some(address) = fee_signer {
            self.fee_signer = Some(FeeSignerSection { address });
        }
    }

    pub fn resolve(&self) -> Result<AppConfig> {
        let router = &self.router;
        let mut settings = RouterSettings::new(
            parse_address("router.address", &router.address)?,
            parse_address("router.owner", &router.owner)?,
            parse_address("router.wrapped_native", &router.wrapped_native)?,
        );
        settings.chain_id = router.chain_id;
        settings.domain_name = router.domain_name.clone();
        settings.domain_version = router.domain_version.clone();

        if let Some(fee) = &self.protocol_fee {
            let share = Decimal::from_str(fee.share.trim())
                .with_context(|| format!("protocol_fee.share is not a decimal: {}", fee.share))?;
            let share = Share::from_decimal(share).context("protocol_fee.share out of range")?;
            settings.protocol_fee_default = FeeDescriptor::new(
                share,
                parse_address("protocol_fee.beneficiary", &fee.beneficiary)?,
            );
        }
        if let Some(signer) = &self.fee_signer {
            settings.fee_signer = Some(parse_address("fee_signer.address", &signer.address)?);
        }

        settings.validate().context("Invalid router settings")?;

        Ok(AppConfig {
            settings,
            uniswap_caller: parse_address("executors.uniswap_caller", &self.executors.uniswap_caller)?,
        })
    }
}

fn parse_address(field: &str, value: &str) -> Result<Address> {
    Address::from_str(value.trim()).with_context(|| format!("{} is not an address: {}", field, value))
}

/// Load `.env`, read the TOML file, apply environment overrides
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    dotenv::dotenv().ok();

    let mut file = RouterFileConfig::load(&path)?;
    file.apply_overrides(
        std::env::var("ROUTER_OWNER").ok(),
        std::env::var("ROUTER_FEE_SIGNER").ok(),
    );

    let config = file.resolve()?;
    info!(
        path = %path.as_ref().display(),
        router = %config.settings.address,
        owner = %config.settings.owner,
        "configuration loaded"
    );
    Ok(config)
}
