//! Deployment configuration.
//!
//! The configuration lives in an `Arena.toml` file and can be overridden with
//! `ARENA_`-prefixed environment variables (`__` separates nested keys). It is only
//! ever read once per run: [`ArenaConfig::resolve`] validates it into an immutable
//! [`DeploymentParams`] snapshot before any transaction is sent.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy_core::primitives::{Address, U256};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::DeployError;

/// The default name of the configuration file.
pub const ARENA_CONFIG_FILENAME: &str = "Arena.toml";

/// Prefix of the environment variables overriding configuration values.
pub const ENV_PREFIX: &str = "ARENA_";

/// File keys that are not lowercase, by their lowercase spelling.
const CAMEL_CASE_KEYS: [(&str, &str); 4] = [
    ("basetokenuri", "baseTokenURI"),
    ("feetoaddress", "feeToAddress"),
    ("paymenttokens", "paymentTokens"),
    ("maximummultiplemintitems", "maximumMultipleMintItems"),
];

/// The network used when none is selected.
pub const DEFAULT_NETWORK: &str = "local";

/// RPC endpoint of the default `local` network (Hardhat node / Anvil).
pub const DEFAULT_LOCAL_RPC_URL: &str = "http://localhost:8545";

/// Default directory holding the compiled Hardhat artifacts.
pub const DEFAULT_ARTIFACTS_PATH: &str = "artifacts/contracts";

/// Metadata of the NFT contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    #[serde(rename = "baseTokenURI")]
    pub base_token_uri: String,
}

/// Parameters of the contracts deployed by the canonical plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// NFT metadata.
    pub token: TokenConfig,
    /// Recipient of the marketplace fees.
    #[serde(rename = "feeToAddress")]
    pub fee_to_address: String,
    /// ERC20 tokens accepted as payment by the marketplace, in order.
    #[serde(rename = "paymentTokens", default)]
    pub payment_tokens: Vec<String>,
    /// Maximum number of items the factory mints in a single batch.
    #[serde(rename = "maximumMultipleMintItems")]
    pub maximum_multiple_mint_items: i64,
}

/// Where to find the compiled contracts and how logical components map to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Directory containing `<Contract>.sol/<Contract>.json` artifacts.
    pub path: PathBuf,
    /// Contract implementing the minting-authorization factory.
    pub factory: String,
    /// Contract implementing the NFT.
    pub token: String,
    /// Contract implementing the marketplace.
    pub marketplace: String,
    /// Contract implementing the development payment token.
    pub erc20: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_ARTIFACTS_PATH),
            factory: "ThetaArenaFactory".to_string(),
            token: "ThetaArenaStandardNFT".to_string(),
            marketplace: "ThetaArenaMarketplace".to_string(),
            erc20: "StandardSupportedToken".to_string(),
        }
    }
}

/// A payment token deployed on development networks by `deploy-erc20`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Config {
    pub name: String,
    pub symbol: String,
    /// Supply cap in base units, as a decimal string.
    pub cap: String,
}

/// An RPC endpoint the contracts can be deployed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint of the node.
    pub url: Url,
    /// Unlocked account sending the transactions. Defaults to the node's first account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
}

/// The complete configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub erc20: Vec<Erc20Config>,
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
}

/// Validated, immutable snapshot of the values the canonical plan needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentParams {
    pub token_name: String,
    pub token_symbol: String,
    pub base_token_uri: String,
    pub fee_to: Address,
    pub payment_tokens: Vec<Address>,
    pub maximum_multiple_mint_items: u64,
}

impl ArenaConfig {
    /// Load the configuration from a TOML file, merged with `ARENA_*` environment
    /// variables.
    ///
    /// If `path` is a directory, `Arena.toml` inside it is used.
    pub fn load(path: &Path) -> Result<Self, DeployError> {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    fn load_with_env_prefix(path: &Path, env_prefix: &str) -> Result<Self, DeployError> {
        let config_path = if path.is_dir() {
            path.join(ARENA_CONFIG_FILENAME)
        } else {
            path.to_path_buf()
        };

        if !config_path.exists() {
            return Err(DeployError::Configuration(format!(
                "configuration file not found: {}",
                config_path.display()
            )));
        }

        let config: Self = Figment::new()
            .merge(Toml::file(&config_path))
            .merge(
                Env::prefixed(env_prefix)
                    .split("__")
                    .lowercase(false)
                    .map(|key| env_key(key.as_str()).into()),
            )
            .extract()
            .map_err(|e| DeployError::Configuration(e.to_string()))?;

        tracing::info!(path = %config_path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse a configuration from a TOML string, without environment overrides.
    pub fn from_toml(content: &str) -> Result<Self, DeployError> {
        toml::from_str(content).map_err(|e| DeployError::Configuration(e.to_string()))
    }

    /// Validate the contract parameters into a [`DeploymentParams`] snapshot.
    pub fn resolve(&self) -> Result<DeploymentParams, DeployError> {
        let contracts = &self.contracts;

        require_non_empty("token.name", &contracts.token.name)?;
        require_non_empty("token.symbol", &contracts.token.symbol)?;

        let fee_to = parse_address("feeToAddress", &contracts.fee_to_address)?;

        let payment_tokens = contracts
            .payment_tokens
            .iter()
            .enumerate()
            .map(|(i, token)| parse_address(&format!("paymentTokens[{i}]"), token))
            .collect::<Result<Vec<_>, _>>()?;

        let maximum_multiple_mint_items = u64::try_from(contracts.maximum_multiple_mint_items)
            .map_err(|_| {
                DeployError::Configuration(format!(
                    "maximumMultipleMintItems must be a non-negative integer, got {}",
                    contracts.maximum_multiple_mint_items
                ))
            })?;

        Ok(DeploymentParams {
            token_name: contracts.token.name.clone(),
            token_symbol: contracts.token.symbol.clone(),
            base_token_uri: contracts.token.base_token_uri.clone(),
            fee_to,
            payment_tokens,
            maximum_multiple_mint_items,
        })
    }

    /// Look up a network by name.
    ///
    /// `local` falls back to `http://localhost:8545` when it is not declared.
    pub fn network(&self, name: &str) -> Result<NetworkConfig, DeployError> {
        if let Some(network) = self.networks.get(name) {
            return Ok(network.clone());
        }

        if name == DEFAULT_NETWORK {
            let url = Url::parse(DEFAULT_LOCAL_RPC_URL)
                .map_err(|e| DeployError::Configuration(e.to_string()))?;
            return Ok(NetworkConfig { url, from: None });
        }

        Err(DeployError::Configuration(format!(
            "unknown network `{}` (declared: {})",
            name,
            self.networks.keys().cloned().collect::<Vec<_>>().join(", ")
        )))
    }
}

impl Erc20Config {
    /// The supply cap as a 256-bit integer.
    pub fn cap(&self) -> Result<U256, DeployError> {
        U256::from_str_radix(self.cap.trim(), 10).map_err(|e| {
            DeployError::Configuration(format!(
                "erc20 `{}`: invalid cap `{}`: {}",
                self.symbol, self.cap, e
            ))
        })
    }
}

/// Spell an environment key (`CONTRACTS.FEETOADDRESS`) the way the file does
/// (`contracts.feeToAddress`), so the override replaces the file value.
fn env_key(key: &str) -> String {
    key.split('.')
        .map(|segment| {
            let segment = segment.to_ascii_lowercase();
            CAMEL_CASE_KEYS
                .iter()
                .find(|(lower, _)| *lower == segment)
                .map_or(segment, |(_, camel)| camel.to_string())
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn require_non_empty(field: &str, value: &str) -> Result<(), DeployError> {
    if value.trim().is_empty() {
        return Err(DeployError::Configuration(format!(
            "{field} must be a non-empty string"
        )));
    }
    Ok(())
}

/// Parse a 0x-prefixed, 40 hex chars address.
pub(crate) fn parse_address(field: &str, value: &str) -> Result<Address, DeployError> {
    let invalid = |reason: &str| {
        DeployError::Configuration(format!("{field}: invalid address '{value}': {reason}"))
    };

    if !value.starts_with("0x") || value.len() != 42 {
        return Err(invalid("expected 0x-prefixed 40 hex chars"));
    }

    if !value[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("contains non-hex characters"));
    }

    Address::from_str(value).map_err(|e| invalid(&e.to_string()))
}
