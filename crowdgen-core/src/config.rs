//! Sale configuration: the externally validated input of the composition engine.
//!
//! The shape follows the generator's input document: `token`, `sale`, `locker`
//! and an `address` map of role → deployed address. Loading accepts JSON or
//! TOML (chosen by file extension). The engine never re-validates ranges; it
//! only requires the document to deserialize.
//!
//! `ConfigFingerprint` is a BLAKE3 hash of the canonical JSON form and serves
//! as the memoization key for composition plans.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::convert::{Address, Amount, Timestamp};

/// Errors from loading or fingerprinting a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config format '{0}' (expected .json or .toml)")]
    UnsupportedFormat(String),
}

// ─── Document ───────────────────────────────────────────────────────

/// Complete generator input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub token: TokenConfig,
    pub sale: SaleConfig,
    #[serde(default)]
    pub locker: LockerConfig,
    /// Role → address (`vault`, `token`, `kyc`, `locker`, ...).
    #[serde(default)]
    pub address: BTreeMap<String, Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub token_type: TokenType,
    #[serde(default)]
    pub token_option: TokenOption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenType {
    pub is_minime: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenOption {
    #[serde(default)]
    pub burnable: bool,
    #[serde(default)]
    pub pausable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleConfig {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub coeff: Amount,
    pub max_cap: Amount,
    pub min_cap: Amount,
    pub new_token_owner: Address,
    pub rate: RateConfig,
    #[serde(default)]
    pub valid_purchase: ValidPurchase,
    #[serde(default)]
    pub stages: Vec<StageConfig>,
    #[serde(default)]
    pub distribution: DistributionConfig,
}

/// Sale rate model. A non-static rate selects the bonus-curve module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateConfig {
    pub is_static: bool,
    pub base_rate: Amount,
    #[serde(default)]
    pub bonus_coeff: Amount,
    #[serde(default)]
    pub bonus: BonusConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusConfig {
    #[serde(default)]
    pub time_bonuses: Vec<TimeBonus>,
    #[serde(default)]
    pub amount_bonuses: Vec<AmountBonus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBonus {
    pub bonus_time_stage: Timestamp,
    pub bonus_time_ratio: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountBonus {
    pub bonus_amount_stage: Amount,
    pub bonus_amount_ratio: u64,
}

/// Purchase validation rules. Zero disables a rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidPurchase {
    #[serde(default)]
    pub max_purchase_limit: Amount,
    #[serde(default)]
    pub min_purchase_limit: Amount,
    #[serde(default)]
    pub block_interval: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub cap_ratio: u64,
    #[serde(default)]
    pub max_purchase_limit: Amount,
    #[serde(default)]
    pub min_purchase_limit: Amount,
    #[serde(default)]
    pub kyc: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionConfig {
    #[serde(default)]
    pub ether: Vec<EtherHolder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtherHolder {
    pub holder: Address,
    pub ratio: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockerConfig {
    #[serde(default)]
    pub use_locker: bool,
    #[serde(default)]
    pub beneficiaries: Vec<Beneficiary>,
}

/// A token-lock beneficiary. `is_straight` selects linear over graded release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub address: Address,
    pub is_straight: bool,
    #[serde(default)]
    pub release: Vec<Release>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub release_time: Timestamp,
    pub release_ratio: u64,
}

// ─── Loading ────────────────────────────────────────────────────────

impl Configuration {
    /// Load from a `.json` or `.toml` file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("toml") => Self::from_toml_str(&text),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn address_of(&self, role: &str) -> Option<&Address> {
        self.address.get(role)
    }

    /// True if any stage requires KYC.
    pub fn requires_kyc(&self) -> bool {
        self.sale.stages.iter().any(|s| s.kyc)
    }

    /// Deterministic identity of this configuration.
    ///
    /// Canonical serialization: struct fields in declaration order, the address
    /// map sorted (BTreeMap), amounts as decimal strings.
    pub fn fingerprint(&self) -> Result<ConfigFingerprint, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(ConfigFingerprint::from_bytes(&json))
    }
}

/// BLAKE3 hash of a configuration's canonical JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigFingerprint(pub String);

impl ConfigFingerprint {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }
}

impl fmt::Display for ConfigFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
