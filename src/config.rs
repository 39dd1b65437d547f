//! Hub-wide settings.

use crate::error::{HubError, Result};
use serde::Deserialize;
use std::time::Duration;

/// Hub configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Capacity given to channels configured with defaults.
    /// Default: 100
    pub default_capacity: usize,

    /// Advisory retention for channels configured with defaults.
    /// Default: 3600
    pub default_retention_secs: u64,

    /// Largest payload a channel accepts (None = unlimited).
    pub max_payload_bytes: Option<usize>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            default_capacity: 100,
            default_retention_secs: 3600,
            max_payload_bytes: None,
        }
    }
}

impl HubConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: HubConfig = serde_json::from_str(json)
            .map_err(|e| HubError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_retention_secs == 0 {
            return Err(HubError::InvalidConfig(
                "default_retention_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn default_retention(&self) -> Duration {
        Duration::from_secs(self.default_retention_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_partial() {
        let config = HubConfig::from_json(r#"{"default_capacity": 16}"#).unwrap();
        assert_eq!(config.default_capacity, 16);
        assert_eq!(config.default_retention_secs, 3600);
        assert_eq!(config.max_payload_bytes, None);
    }

    #[test]
    fn test_from_json_rejects_zero_retention() {
        let result = HubConfig::from_json(r#"{"default_retention_secs": 0}"#);
        assert!(matches!(result, Err(HubError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let result = HubConfig::from_json("not json");
        assert!(matches!(result, Err(HubError::InvalidConfig(_))));
    }
}
