use serde::{Deserialize, Serialize};

use crate::types::{KdfParams, DEFAULT_SS58_PREFIX};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub worker: WorkerConfig,
    pub client: ClientConfig,
    pub keystore: KeystoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub thread_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub request_timeout_ms: u64,
    pub ss58_prefix: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystoreConfig {
    /// Argon2 costs used when new accounts are created.
    pub kdf: KdfParams,
    /// Directory holding `<address>.json` records, when file-backed.
    pub directory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            thread_name: "signing-worker".to_string(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30000,
            ss58_prefix: DEFAULT_SS58_PREFIX,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RelayConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RelayConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.client.ss58_prefix > 16383 {
            return Err(ConfigError::Invalid(format!(
                "SS58 prefix {} is out of range (0..=16383)",
                self.client.ss58_prefix
            )));
        }

        if self.worker.thread_name.is_empty() {
            return Err(ConfigError::Invalid(
                "Worker thread name must not be empty".to_string(),
            ));
        }

        self.keystore
            .kdf
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(())
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.client.request_timeout_ms = timeout_ms;
        self
    }

    pub fn with_ss58_prefix(mut self, prefix: u16) -> Self {
        self.client.ss58_prefix = prefix;
        self
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.keystore.kdf = kdf;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RelayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.client.request_timeout_ms, 30000);
        assert_eq!(config.client.ss58_prefix, 42);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = RelayConfig::from_json(r#"{"client": {"ss58_prefix": 0}}"#).unwrap();
        assert_eq!(config.client.ss58_prefix, 0);
        assert_eq!(config.client.request_timeout_ms, 30000);
        assert_eq!(config.worker.thread_name, "signing-worker");
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(RelayConfig::default()
            .with_request_timeout_ms(0)
            .validate()
            .is_err());
        assert!(RelayConfig::default()
            .with_ss58_prefix(20000)
            .validate()
            .is_err());
        assert!(RelayConfig::from_json(r#"{"keystore": {"kdf": {"mCost": 1, "tCost": 0, "pCost": 0}}}"#).is_err());
    }

    #[test]
    fn rejects_kdf_costs_above_limits() {
        let too_costly = KdfParams {
            m_cost: KdfParams::MAX.m_cost + 1,
            ..KdfParams::default()
        };
        assert!(matches!(
            RelayConfig::default().with_kdf(too_costly).validate(),
            Err(ConfigError::Invalid(_))
        ));
        assert!(RelayConfig::from_json(r#"{"keystore": {"kdf": {"mCost": 19456, "tCost": 4294967295, "pCost": 1}}}"#).is_err());
    }

    #[test]
    fn json_round_trips() {
        let config = RelayConfig::default().with_ss58_prefix(0);
        let json = config.to_json().unwrap();
        assert_eq!(RelayConfig::from_json(&json).unwrap(), config);
    }
}
