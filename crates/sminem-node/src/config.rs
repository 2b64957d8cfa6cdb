//! Ecosystem configuration.
//!
//! [`EcosystemConfig`] is layered from built-in defaults, an optional
//! TOML/JSON file, and `SMINEM__*` environment variables (highest
//! precedence). [`EcosystemConfig::validate`] enforces the construction rules
//! before anything is built from it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sminem_core::address::Address;
use sminem_core::constants::{DEFAULT_DECIMALS, DEFAULT_MAX_BATCH_SIZE, MAX_DECIMALS, fragments_per_token};
use sminem_core::error::ConfigError;

/// Environment variable prefix, e.g. `SMINEM__MULTIPLICITY=3`.
pub const ENV_PREFIX: &str = "SMINEM";

/// Everything needed to build a fresh ecosystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcosystemConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Initial supply in whole tokens, minted to `owner`.
    pub initial_supply: u64,
    /// Administrator and initial holder.
    pub owner: Address,
    /// Address of the fungible ledger, also the default transfer-counter source.
    pub token_address: Address,
    pub base_uri: String,
    /// Qualifying transfers per threshold.
    pub multiplicity: u64,
    /// Mint units granted per threshold.
    pub units_per_threshold: u64,
    pub max_batch_size: usize,
    /// Receivers that refuse newly minted tokens.
    pub rejecting_receivers: Vec<Address>,
}

impl Default for EcosystemConfig {
    fn default() -> Self {
        Self {
            name: "Sminem".to_string(),
            symbol: "SMINEM".to_string(),
            decimals: DEFAULT_DECIMALS,
            initial_supply: 100_000,
            owner: Address::ZERO,
            token_address: Address::from_label("sminem-token"),
            base_uri: "https://sminem.io/nft/".to_string(),
            multiplicity: 10,
            units_per_threshold: 1,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            rejecting_receivers: Vec::new(),
        }
    }
}

impl EcosystemConfig {
    /// Load defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("rejecting_receivers")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::Load(e.to_string()))
    }

    /// Check every construction rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.decimals == 0 || self.decimals > MAX_DECIMALS {
            return Err(ConfigError::InvalidDecimals {
                got: self.decimals,
                max: MAX_DECIMALS,
            });
        }
        if self.initial_supply == 0 {
            return Err(ConfigError::ZeroSupply);
        }
        self.total_fragments()?;
        if self.owner.is_zero() {
            return Err(ConfigError::ZeroOwner);
        }
        if self.token_address.is_zero() {
            return Err(ConfigError::ZeroTokenSource);
        }
        if self.base_uri.is_empty() {
            return Err(ConfigError::EmptyBaseUri);
        }
        if self.multiplicity == 0 {
            return Err(ConfigError::ZeroMultiplicity);
        }
        if self.units_per_threshold == 0 {
            return Err(ConfigError::ZeroUnitsPerThreshold);
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }

    /// Initial supply in fragments.
    pub fn total_fragments(&self) -> Result<u64, ConfigError> {
        fragments_per_token(self.decimals)
            .and_then(|unit| self.initial_supply.checked_mul(unit))
            .ok_or(ConfigError::SupplyOverflow)
    }
}

/// Default snapshot location: `<data_dir>/sminem/state.bin`.
pub fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sminem")
        .join("state.bin")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> EcosystemConfig {
        EcosystemConfig {
            owner: Address::from_label("owner"),
            ..EcosystemConfig::default()
        }
    }

    #[test]
    fn defaults_need_only_an_owner() {
        assert_eq!(EcosystemConfig::default().validate(), Err(ConfigError::ZeroOwner));
        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn default_supply_in_fragments() {
        assert_eq!(valid().total_fragments(), Ok(100_000_000_000_000));
    }

    #[test]
    fn rejects_each_invalid_field() {
        let cases: Vec<(EcosystemConfig, ConfigError)> = vec![
            (EcosystemConfig { name: " ".into(), ..valid() }, ConfigError::EmptyName),
            (EcosystemConfig { symbol: String::new(), ..valid() }, ConfigError::EmptySymbol),
            (
                EcosystemConfig { decimals: 0, ..valid() },
                ConfigError::InvalidDecimals { got: 0, max: MAX_DECIMALS },
            ),
            (
                EcosystemConfig { decimals: 19, ..valid() },
                ConfigError::InvalidDecimals { got: 19, max: MAX_DECIMALS },
            ),
            (EcosystemConfig { initial_supply: 0, ..valid() }, ConfigError::ZeroSupply),
            (
                EcosystemConfig { initial_supply: u64::MAX, ..valid() },
                ConfigError::SupplyOverflow,
            ),
            (
                EcosystemConfig { token_address: Address::ZERO, ..valid() },
                ConfigError::ZeroTokenSource,
            ),
            (EcosystemConfig { base_uri: String::new(), ..valid() }, ConfigError::EmptyBaseUri),
            (EcosystemConfig { multiplicity: 0, ..valid() }, ConfigError::ZeroMultiplicity),
            (
                EcosystemConfig { units_per_threshold: 0, ..valid() },
                ConfigError::ZeroUnitsPerThreshold,
            ),
            (EcosystemConfig { max_batch_size: 0, ..valid() }, ConfigError::ZeroBatchSize),
        ];
        for (cfg, want) in cases {
            assert_eq!(cfg.validate(), Err(want));
        }
    }

    #[test]
    fn loads_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sminem.toml");
        let owner = Address::from_label("owner");
        let rejecting = Address::from_label("contract");
        std::fs::write(
            &path,
            format!(
                "symbol = \"SMN\"\nowner = \"{owner}\"\nmultiplicity = 3\n\
                 rejecting_receivers = [\"{rejecting}\"]\n"
            ),
        )
        .unwrap();

        let cfg = EcosystemConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.symbol, "SMN");
        assert_eq!(cfg.owner, owner);
        assert_eq!(cfg.multiplicity, 3);
        assert_eq!(cfg.rejecting_receivers, vec![rejecting]);
        assert_eq!(cfg.name, "Sminem");
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = EcosystemConfig::load(Some(Path::new("/nonexistent/sminem.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn default_state_path_ends_with_state_bin() {
        let p = default_state_path();
        assert!(p.ends_with("sminem/state.bin"), "{p:?}");
    }
}
