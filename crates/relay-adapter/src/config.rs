use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use relay_publish::BrokerConfig;
use relay_source::LedgerConfig;
use relay_types::AccountId;

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "CHAIN_ADAPTER_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidOverride {
        var: String,
        value: String,
        reason: String,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// File holding the height of the last relayed block.
    pub path: PathBuf,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("last_read_block.txt"),
        }
    }
}

/// Everything the adapter needs to run, loaded from TOML.
///
/// ```toml
/// [ledger]
/// endpoint = "127.0.0.1:50051"
/// account = "relay@notary"
/// keys_dir = "keys"
///
/// [broker]
/// host = "localhost"
/// port = 5672
/// vhost = "/"
/// username = "guest"
/// password = "guest"
/// exchange = "ledger-blocks"
/// routing_key = "blocks"
/// publish_timeout_ms = 5000
///
/// [checkpoint]
/// path = "last_read_block.txt"
/// ```
///
/// Missing sections and fields fall back to their defaults.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub ledger: LedgerConfig,
    pub broker: BrokerConfig,
    pub checkpoint: CheckpointConfig,
}

impl AdapterConfig {
    /// Read `path`, apply `CHAIN_ADAPTER_*` overrides from the environment
    /// and validate the result.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_overrides(std::env::vars_os())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply overrides from `(name, value)` pairs, as yielded by
    /// `std::env::vars_os`. Names without the `CHAIN_ADAPTER_` prefix are
    /// skipped whatever their encoding; a prefixed value that is not UTF-8
    /// is an error. Prefixed names unknown to the adapter are ignored.
    pub fn apply_overrides<I, K, V>(&mut self, vars: I) -> ConfigResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        for (var, value) in vars {
            let var = var.into().to_string_lossy().into_owned();
            let Some(key) = var.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let invalid = |value: &str, reason: String| ConfigError::InvalidOverride {
                var: var.clone(),
                value: value.to_owned(),
                reason,
            };
            let value = value
                .into()
                .into_string()
                .map_err(|raw| invalid(&raw.to_string_lossy(), "not valid UTF-8".into()))?;
            match key {
                "LEDGER_ENDPOINT" => self.ledger.endpoint = value,
                "LEDGER_ACCOUNT" => {
                    self.ledger.account = value
                        .parse::<AccountId>()
                        .map_err(|e| invalid(&value, e.to_string()))?;
                }
                "KEYS_DIR" => self.ledger.keys_dir = PathBuf::from(value),
                "BROKER_HOST" => self.broker.host = value,
                "BROKER_PORT" => {
                    self.broker.port = value
                        .parse()
                        .map_err(|e: std::num::ParseIntError| invalid(&value, e.to_string()))?;
                }
                "BROKER_VHOST" => self.broker.vhost = value,
                "BROKER_USERNAME" => self.broker.username = value,
                "BROKER_PASSWORD" => self.broker.password = value,
                "BROKER_EXCHANGE" => self.broker.exchange = value,
                "CHECKPOINT_PATH" => self.checkpoint.path = PathBuf::from(value),
                _ => {}
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.ledger.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("ledger endpoint is empty".into()));
        }
        if self.checkpoint.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("checkpoint path is empty".into()));
        }
        self.broker
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
