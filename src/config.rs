use alloy_primitives::Address;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::api::ipfs::DEFAULT_IPFS_API;
use crate::market::{parse_time, MarketRequest, MarketType, Question, Timestamps};

/// Env var that overrides `[credentials] private_key`.
pub const PRIVATE_KEY_VAR: &str = "RC_PRIVATE_KEY";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub networks: BTreeMap<String, Network>,
    pub market: Option<MarketTable>,
    #[serde(default)]
    pub compiler: Compiler,
    #[serde(default)]
    pub ipfs: Ipfs,
}

#[derive(Default, Deserialize)]
pub struct Credentials {
    pub private_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct General {
    pub log_level: String,
    /// Profile used when none is given on the command line
    pub network: Option<String>,
    pub preflight: bool,
    pub read_back: bool,
}

impl Default for General {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            network: None,
            preflight: true,
            read_back: true,
        }
    }
}

/// One deployment target.
#[derive(Debug, Clone, Deserialize)]
pub struct Network {
    pub rpc_url: String,
    pub factory: Address,
    /// Checked against the node before sending
    pub chain_id: Option<u64>,
    pub gas: Option<u64>,
    /// Wei; TOML integers stop at i64
    pub gas_price: Option<u64>,
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
}

fn default_confirmations() -> u64 {
    1
}

/// A time as Unix seconds or an RFC 3339 string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    Secs(u64),
    Text(String),
}

impl Default for TimeValue {
    fn default() -> Self {
        Self::Secs(0)
    }
}

impl TimeValue {
    pub fn resolve(&self) -> Result<u64> {
        match self {
            Self::Secs(s) => Ok(*s),
            Self::Text(s) => parse_time(s),
        }
    }
}

/// Either an already packed question string, sent byte for byte,
/// or its fields to be packed.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuestionValue {
    Packed(String),
    Fields {
        text: String,
        #[serde(default)]
        outcomes: Vec<String>,
        category: Option<String>,
        locale: Option<String>,
    },
}

impl QuestionValue {
    pub fn to_packed(&self) -> String {
        match self {
            Self::Packed(raw) => raw.clone(),
            Self::Fields {
                text,
                outcomes,
                category,
                locale,
            } => Question {
                text: text.clone(),
                outcomes: outcomes.clone(),
                category: category.clone(),
                locale: locale.clone(),
            }
            .encode(),
        }
    }
}

/// The literal parameters of the market to create.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketTable {
    #[serde(default)]
    pub market_type: MarketType,
    pub ipfs_hash: String,
    #[serde(default)]
    pub opening_time: TimeValue,
    pub locking_time: TimeValue,
    pub resolution_time: TimeValue,
    pub token_uris: Vec<String>,
    #[serde(default)]
    pub artist: Address,
    #[serde(default)]
    pub affiliate: Address,
    /// Defaults to no affiliate for every card
    pub card_affiliates: Option<Vec<Address>>,
    pub question: QuestionValue,
}

impl MarketTable {
    pub fn to_request(&self) -> Result<MarketRequest> {
        let timestamps = Timestamps::new(
            self.opening_time.resolve().context("opening_time")?,
            self.locking_time.resolve().context("locking_time")?,
            self.resolution_time.resolve().context("resolution_time")?,
        );

        let mut request = MarketRequest {
            market_type: self.market_type,
            ipfs_hash: self.ipfs_hash.clone(),
            timestamps,
            token_uris: self.token_uris.clone(),
            artist: self.artist,
            affiliate: self.affiliate,
            card_affiliates: Vec::new(),
            question: self.question.to_packed(),
        };
        request.card_affiliates = match &self.card_affiliates {
            Some(list) => list.clone(),
            None => request.no_card_affiliates(),
        };
        Ok(request)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Compiler {
    pub version: String,
    pub evm_version: String,
    pub optimizer: Optimizer,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Optimizer {
    pub enabled: bool,
    pub runs: u32,
}

impl Default for Compiler {
    fn default() -> Self {
        Self {
            version: "0.5.13".to_string(),
            evm_version: "istanbul".to_string(),
            optimizer: Optimizer {
                enabled: true,
                runs: 10,
            },
        }
    }
}

impl Compiler {
    /// The `settings` object of a solc standard-JSON input.
    pub fn solc_settings(&self) -> serde_json::Value {
        serde_json::json!({
            "evmVersion": self.evm_version,
            "optimizer": {
                "enabled": self.optimizer.enabled,
                "runs": self.optimizer.runs,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ipfs {
    pub api_url: String,
}

impl Default for Ipfs {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_IPFS_API.to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Bad config {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    /// Pick a network profile: explicit name, then `[general] network`,
    /// then the only profile if there is exactly one.
    pub fn network(&self, name: Option<&str>) -> Result<(&str, &Network)> {
        let name = match name.or(self.general.network.as_deref()) {
            Some(name) => name,
            None if self.networks.len() == 1 => self.networks.keys().next().map(String::as_str).unwrap_or_default(),
            None => {
                return Err(anyhow!(
                    "No network selected, pick one of: {}",
                    self.network_names()
                ))
            }
        };

        self.networks
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| anyhow!("Unknown network {:?}, have: {}", name, self.network_names()))
    }

    fn network_names(&self) -> String {
        self.networks.keys().cloned().collect::<Vec<_>>().join(", ")
    }

    pub fn market(&self) -> Result<&MarketTable> {
        self.market
            .as_ref()
            .ok_or_else(|| anyhow!("Config has no [market] table"))
    }

    /// Signing key from the environment, else from the config file.
    pub fn private_key(&self) -> Result<String> {
        std::env::var(PRIVATE_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.credentials.private_key.clone())
            .ok_or_else(|| anyhow!("No private key: set {} or [credentials] private_key", PRIVATE_KEY_VAR))
    }
}
