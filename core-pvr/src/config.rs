//! # Bridge Configuration
//!
//! Configuration types for the PVR stream bridge.

use crate::error::{PvrError, Result};
use serde::{Deserialize, Serialize};

/// Settings key that toggles radio RDS decoding.
pub const ENABLE_RADIO_RDS: &str = "pvrplayback.enableradiords";

/// Stream bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Settings key consulted on every stream map rebuild to decide whether
    /// RDS streams get their own descriptor type.
    ///
    /// Default: `pvrplayback.enableradiords`.
    #[serde(default = "default_rds_setting_key")]
    pub rds_setting_key: String,

    /// Fallback used when the settings store has no value for
    /// `rds_setting_key` or cannot be read.
    ///
    /// Default: false.
    #[serde(default)]
    pub enable_radio_rds: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            rds_setting_key: default_rds_setting_key(),
            enable_radio_rds: false,
        }
    }
}

impl BridgeConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.rds_setting_key.trim().is_empty() {
            return Err(PvrError::InvalidConfig(
                "rds_setting_key must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_rds_setting_key() -> String {
    ENABLE_RADIO_RDS.to_string()
}
