//! Configuration management
//!
//! Settings come from a TOML file, then `.env` / process environment
//! overrides for deployment-specific values (`RPC_URL`, `EXECUTOR_ADDRESS`,
//! `BUDGET_WEI`). Every section is optional; an empty file yields mainnet
//! defaults. Big-integer amounts are decimal strings.
//!
//! Created: 2026-10-17

use crate::pool::{parse_amount, DiscoveryConfig};
use crate::types::{DexType, FeeRatio, Market};
use alloy::primitives::Address;
use anyhow::{bail, Context, Result};
use num_bigint::BigUint;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Mainnet WETH
pub const WETH_ADDRESS: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";
/// Uniswap-like batch query contract
pub const UNISWAP_LIKE_QUERY_ADDRESS: &str = "0x5EF1009b9FCD4fec3094a5564047e190D72Bd511";
pub const UNISWAP_V2_FACTORY: &str = "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f";
pub const SUSHISWAP_FACTORY: &str = "0xC0AEe478e3658e2610c5F7A4A2E1777cE9e4f2Ac";
/// Tokens whose pairs misreport reserves
pub const DEFAULT_BLACKLIST: [&str; 1] = ["0xD75EA151a61d06868E31F8988D28DFE5E9df57B4"];
/// 0.01 WETH
pub const DEFAULT_MIN_PROFIT_WEI: &str = "10000000000000000";
/// 2 WETH
pub const DEFAULT_MIN_QUOTE_LIQUIDITY_WEI: &str = "2000000000000000000";

/// Top-level TOML configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default = "default_markets")]
    pub markets: Vec<MarketSection>,
    #[serde(default)]
    pub discovery: DiscoverySection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Sizing and selection settings
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    #[serde(default = "default_quote_token")]
    pub quote_token: String,
    #[serde(default = "default_min_profit")]
    pub min_profit_wei: String,
    #[serde(default = "default_min_quote_liquidity")]
    pub min_quote_liquidity_wei: String,
    /// Fixed budget, used when no executor balance is available
    pub budget_wei: Option<String>,
}

/// Chain access settings
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSection {
    pub rpc_url: Option<String>,
    #[serde(default = "default_query_contract")]
    pub query_contract: String,
    /// Contract whose quote-token balance is the trading budget
    pub executor_address: Option<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_reserve_batch_size")]
    pub reserve_batch_size: usize,
}

/// One pair factory
#[derive(Debug, Clone, Deserialize)]
pub struct MarketSection {
    pub dex: String,
    pub factory: String,
    #[serde(default = "default_fee_numerator")]
    pub fee_numerator: u64,
    #[serde(default = "default_fee_denominator")]
    pub fee_denominator: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySection {
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    #[serde(default = "default_batch_count_limit")]
    pub batch_count_limit: u64,
    #[serde(default = "default_blacklist")]
    pub blacklist_tokens: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_quote_token() -> String { WETH_ADDRESS.to_string() }
fn default_min_profit() -> String { DEFAULT_MIN_PROFIT_WEI.to_string() }
fn default_min_quote_liquidity() -> String { DEFAULT_MIN_QUOTE_LIQUIDITY_WEI.to_string() }
fn default_query_contract() -> String { UNISWAP_LIKE_QUERY_ADDRESS.to_string() }
fn default_poll_interval() -> u64 { 1000 }
fn default_reserve_batch_size() -> usize { 500 }
fn default_fee_numerator() -> u64 { 3 }
fn default_fee_denominator() -> u64 { 1000 }
fn default_batch_size() -> u64 { 1000 }
fn default_batch_count_limit() -> u64 { 100 }
fn default_blacklist() -> Vec<String> { DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect() }
fn default_log_level() -> String { "info".to_string() }

fn default_markets() -> Vec<MarketSection> {
    vec![
        MarketSection {
            dex: DexType::UniswapV2.to_string(),
            factory: UNISWAP_V2_FACTORY.to_string(),
            fee_numerator: default_fee_numerator(),
            fee_denominator: default_fee_denominator(),
        },
        MarketSection {
            dex: DexType::Sushiswap.to_string(),
            factory: SUSHISWAP_FACTORY.to_string(),
            fee_numerator: default_fee_numerator(),
            fee_denominator: default_fee_denominator(),
        },
    ]
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            quote_token: default_quote_token(),
            min_profit_wei: default_min_profit(),
            min_quote_liquidity_wei: default_min_quote_liquidity(),
            budget_wei: None,
        }
    }
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            rpc_url: None,
            query_contract: default_query_contract(),
            executor_address: None,
            poll_interval_ms: default_poll_interval(),
            reserve_batch_size: default_reserve_batch_size(),
        }
    }
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_count_limit: default_batch_count_limit(),
            blacklist_tokens: default_blacklist(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TomlConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Apply environment overrides; `lookup` is `std::env::var` in production
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("RPC_URL") {
            self.network.rpc_url = Some(url);
        }
        if let Some(executor) = lookup("EXECUTOR_ADDRESS") {
            self.network.executor_address = Some(executor);
        }
        if let Some(budget) = lookup("BUDGET_WEI") {
            self.engine.budget_wei = Some(budget);
        }
    }

    /// Validate and convert into typed settings
    pub fn resolve(&self) -> Result<EngineConfig> {
        let markets = self
            .markets
            .iter()
            .map(MarketSection::to_market)
            .collect::<Result<Vec<_>>>()?;

        let blacklist_tokens = self
            .discovery
            .blacklist_tokens
            .iter()
            .map(|t| parse_address(t, "discovery.blacklist_tokens"))
            .collect::<Result<HashSet<_>>>()?;

        if self.network.reserve_batch_size == 0 {
            bail!("network.reserve_batch_size must be positive");
        }
        if self.discovery.batch_size == 0 {
            bail!("discovery.batch_size must be positive");
        }

        Ok(EngineConfig {
            quote_token: parse_address(&self.engine.quote_token, "engine.quote_token")?,
            min_profit: parse_amount(&self.engine.min_profit_wei).context("engine.min_profit_wei")?,
            min_quote_liquidity: parse_amount(&self.engine.min_quote_liquidity_wei)
                .context("engine.min_quote_liquidity_wei")?,
            budget: self
                .engine
                .budget_wei
                .as_deref()
                .map(|b| parse_amount(b).context("engine.budget_wei"))
                .transpose()?,
            rpc_url: self.network.rpc_url.clone(),
            query_contract: parse_address(&self.network.query_contract, "network.query_contract")?,
            executor_address: self
                .network
                .executor_address
                .as_deref()
                .map(|a| parse_address(a, "network.executor_address"))
                .transpose()?,
            poll_interval_ms: self.network.poll_interval_ms,
            reserve_batch_size: self.network.reserve_batch_size,
            markets,
            discovery: DiscoveryConfig {
                batch_size: self.discovery.batch_size,
                batch_count_limit: self.discovery.batch_count_limit,
                blacklist_tokens,
            },
            log_level: self.logging.level.clone(),
        })
    }
}

impl MarketSection {
    pub fn to_market(&self) -> Result<Market> {
        let dex: DexType = self.dex.parse()?;
        let factory = parse_address(&self.factory, "markets.factory")?;
        let fee = FeeRatio::new(self.fee_numerator, self.fee_denominator)
            .with_context(|| format!("Invalid fee for {} market", dex))?;
        Ok(Market { dex, factory, fee })
    }
}

/// Validated engine settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub quote_token: Address,
    pub min_profit: BigUint,
    pub min_quote_liquidity: BigUint,
    pub budget: Option<BigUint>,
    pub rpc_url: Option<String>,
    pub query_contract: Address,
    pub executor_address: Option<Address>,
    pub poll_interval_ms: u64,
    pub reserve_batch_size: usize,
    pub markets: Vec<Market>,
    pub discovery: DiscoveryConfig,
    pub log_level: String,
}

impl TomlConfig {
    /// All sections at their defaults (same as an empty file)
    pub fn default_sections() -> Self {
        Self {
            engine: EngineSection::default(),
            network: NetworkSection::default(),
            markets: default_markets(),
            discovery: DiscoverySection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl EngineConfig {
    /// One-line description for the startup log
    pub fn summary(&self) -> String {
        format!(
            "quote {:?}, {} markets, min profit {} wei",
            self.quote_token,
            self.markets.len(),
            self.min_profit
        )
    }
}

/// Load `.env`, then the TOML file at `path` (defaults when `None`), then
/// environment overrides. Runs before logging is set up, so nothing is logged here.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    dotenv::dotenv().ok();

    let mut raw = match path {
        Some(path) => TomlConfig::load(path)?,
        None => TomlConfig::default_sections(),
    };
    raw.apply_env_overrides(|key| std::env::var(key).ok());

    raw.resolve()
}

fn parse_address(value: &str, field: &str) -> Result<Address> {
    value
        .trim()
        .parse::<Address>()
        .with_context(|| format!("Invalid address for {}: '{}'", field, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_file_gives_mainnet_defaults() {
        let config = TomlConfig::parse("").unwrap().resolve().unwrap();

        assert_eq!(config.quote_token, WETH_ADDRESS.parse::<Address>().unwrap());
        assert_eq!(config.min_profit, BigUint::from(10u64.pow(16)));
        assert_eq!(config.min_quote_liquidity, BigUint::from(2_000_000_000_000_000_000u64));
        assert_eq!(config.budget, None);
        assert_eq!(config.markets.len(), 2);
        assert_eq!(config.markets[1].dex, DexType::Sushiswap);
        assert_eq!(config.markets[1].fee, FeeRatio::UNISWAP_V2);
        assert_eq!(config.discovery.batch_size, 1000);
        assert_eq!(config.discovery.blacklist_tokens.len(), 1);
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_summary_names_quote_markets_and_threshold() {
        let config = TomlConfig::default_sections().resolve().unwrap();
        assert_eq!(
            config.summary(),
            format!("quote {:?}, 2 markets, min profit 10000000000000000 wei", config.quote_token)
        );
    }

    #[test]
    fn test_default_sections_match_empty_file() {
        let config = TomlConfig::default_sections().resolve().unwrap();
        assert_eq!(config.markets.len(), 2);
        assert_eq!(config.query_contract, UNISWAP_LIKE_QUERY_ADDRESS.parse::<Address>().unwrap());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[engine]
min_profit_wei = "50000000000000000"
budget_wei = "123456789012345678901234567890"

[network]
rpc_url = "http://localhost:8545"
poll_interval_ms = 250

[[markets]]
dex = "sushi"
factory = "0xC0AEe478e3658e2610c5F7A4A2E1777cE9e4f2Ac"
fee_numerator = 25
fee_denominator = 10000

[discovery]
batch_size = 200
blacklist_tokens = []

[logging]
level = "debug"
"#;

        let config = TomlConfig::parse(toml_str).unwrap().resolve().unwrap();
        assert_eq!(config.min_profit, BigUint::from(5u64 * 10u64.pow(16)));
        assert_eq!(
            config.budget,
            Some("123456789012345678901234567890".parse::<BigUint>().unwrap())
        );
        assert_eq!(config.rpc_url.as_deref(), Some("http://localhost:8545"));
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.markets.len(), 1);
        assert_eq!(config.markets[0].fee, FeeRatio::new(25, 10_000).unwrap());
        assert_eq!(config.discovery.batch_size, 200);
        assert_eq!(config.discovery.batch_count_limit, 100);
        assert!(config.discovery.blacklist_tokens.is_empty());
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("RPC_URL", "ws://node:8546"),
            ("EXECUTOR_ADDRESS", "0x1111111111111111111111111111111111111111"),
            ("BUDGET_WEI", "7"),
        ]
        .into_iter()
        .collect();

        let mut raw = TomlConfig::parse("[network]\nrpc_url = \"http://ignored\"").unwrap();
        raw.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));
        let config = raw.resolve().unwrap();

        assert_eq!(config.rpc_url.as_deref(), Some("ws://node:8546"));
        assert_eq!(config.executor_address, Some(Address::repeat_byte(0x11)));
        assert_eq!(config.budget, Some(BigUint::from(7u32)));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad_fee = "[[markets]]\ndex = \"UniswapV2\"\nfactory = \"0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f\"\nfee_numerator = 1000\nfee_denominator = 1000";
        assert!(TomlConfig::parse(bad_fee).unwrap().resolve().is_err());

        let bad_dex = "[[markets]]\ndex = \"curve\"\nfactory = \"0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f\"";
        assert!(TomlConfig::parse(bad_dex).unwrap().resolve().is_err());

        let bad_amount = "[engine]\nmin_profit_wei = \"0.01\"";
        assert!(TomlConfig::parse(bad_amount).unwrap().resolve().is_err());

        let zero_batch = "[network]\nreserve_batch_size = 0";
        assert!(TomlConfig::parse(zero_batch).unwrap().resolve().is_err());

        assert!(TomlConfig::parse("[unknown]\nkey = 1").is_err());
    }
}
