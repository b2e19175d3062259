//! Provisioning configuration record.
//!
//! A fixed-shape struct persisted as pretty JSON next to the project. The
//! first provisioning run fails with `ConfigMissing` and setup instructions;
//! creating and editing the file is an explicit CLI step, never implicit.

use crate::error::{ProvisionError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default location of the provisioning config file.
pub const DEFAULT_CONFIG_PATH: &str = "do_config.json";

/// Credentials and target host for provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// DigitalOcean API token.
    pub api_key: String,
    /// Path to the public SSH key registered with the droplet.
    pub ssh_keyfile: String,
    /// Remote user to run commands as.
    pub user: String,
    /// Droplet address; filled in when a droplet is created.
    pub host: String,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            api_key: "digital_ocean_key".to_string(),
            ssh_keyfile: "~/.ssh/id_rsa.pub".to_string(),
            user: "root".to_string(),
            host: String::new(),
        }
    }
}

impl ProvisionConfig {
    /// Loads the config from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::ConfigMissing`] when the file does not
    /// exist, or a parse error when it is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ProvisionError::ConfigMissing {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Saves the config to `path` as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error on serialization or filesystem failure.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Writes a default template to `path` unless a file already exists.
    /// Returns whether a new file was created.
    ///
    /// # Errors
    ///
    /// Returns an error on filesystem failure.
    pub fn write_template(path: &Path) -> Result<bool> {
        if path.is_file() {
            return Ok(false);
        }
        Self::default().save(path)?;
        Ok(true)
    }

    /// Validates fields needed to talk to the DigitalOcean API.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::InvalidConfig`] when the API key is empty
    /// or still the template placeholder.
    pub fn require_api_key(&self) -> Result<&str> {
        if self.api_key.is_empty() || self.api_key == "digital_ocean_key" {
            return Err(ProvisionError::InvalidConfig(
                "api_key is unset; paste your DigitalOcean token into the config".to_string(),
            ));
        }
        Ok(&self.api_key)
    }

    /// Validates fields needed to run commands on the remote host.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::InvalidConfig`] when no host is configured.
    pub fn require_host(&self) -> Result<&str> {
        if self.host.is_empty() {
            return Err(ProvisionError::InvalidConfig(
                "host is unset; create a droplet first or fill in the address".to_string(),
            ));
        }
        Ok(&self.host)
    }
}
