use config::{Config, ConfigError, File, FileFormat};
use log::LevelFilter;
use serde::Deserialize;

use super::network::NetworkSettings;

/// JSON-RPC endpoint used for every contract read.
#[derive(Debug, Deserialize, Clone)]
pub struct RpcSettings {
    pub url: String,
}

/// Which block to compute and where to write the records.
#[derive(Debug, Deserialize, Clone)]
pub struct IndexerSettings {
    /// Block to compute, latest when unset
    #[serde(default)]
    pub block: Option<u64>,
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            block: None,
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "records.json".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl LoggingSettings {
    /// Configured level, `Info` when it does not parse.
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Info)
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Root application configuration.
///
/// Loaded from `config.yaml` at startup. The `network` section is the
/// static catalog of tokens, pools and wallets being valued.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub rpc: RpcSettings,
    #[serde(default)]
    pub indexer: IndexerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    pub network: NetworkSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }

    /// Parse settings from an in-memory YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
rpc:
  url: http://localhost:8545
network:
  name: ethereum
  blockchain: Ethereum
  protocol_token: "0x64aa3364f17a4d01c6f1751fd97c2bd3d7e7f1d5"
  tokens:
    - name: OHM
      address: "0x64aa3364f17a4d01c6f1751fd97c2bd3d7e7f1d5"
      decimals: 9
      category: volatile
"#;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_yaml(MINIMAL).unwrap();

        assert_eq!(settings.rpc.url, "http://localhost:8545");
        assert_eq!(settings.indexer.block, None);
        assert_eq!(settings.indexer.output, "records.json");
        assert_eq!(settings.logging.level_filter(), LevelFilter::Info);
        assert!(settings.network.pools.is_empty());
    }

    #[test]
    fn test_level_filter() {
        let logging = LoggingSettings {
            level: "debug".to_string(),
        };
        assert_eq!(logging.level_filter(), LevelFilter::Debug);

        let logging = LoggingSettings {
            level: "loud".to_string(),
        };
        assert_eq!(logging.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn test_missing_rpc_is_rejected() {
        let yaml = MINIMAL.replace("rpc:\n  url: http://localhost:8545\n", "");
        assert!(Settings::from_yaml(&yaml).is_err());
    }
}
