//! Error types for provisioning operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while provisioning the remote host.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The provisioning config file does not exist yet.
    #[error(
        "provisioning config not found at {path}; run `cointick init-config` to create a \
         template, then fill in api_key, ssh_keyfile, user, and host"
    )]
    ConfigMissing {
        /// Where the config was expected.
        path: PathBuf,
    },

    /// A config field failed validation.
    #[error("invalid provisioning config: {0}")]
    InvalidConfig(String),

    /// The requested task is not in the registry.
    #[error("unknown provisioning task: {name}")]
    UnknownTask {
        /// The task name that was requested.
        name: String,
    },

    /// The task graph contains a dependency cycle.
    #[error("dependency cycle involving task '{task}'")]
    DependencyCycle {
        /// A task on the cycle.
        task: String,
    },

    /// A remote command exited with a non-zero status.
    #[error("command failed during task '{task}' (exit {status}): {command}")]
    CommandFailed {
        /// Task the command belongs to.
        task: String,
        /// The command that failed.
        command: String,
        /// Exit status code, or -1 when killed by a signal.
        status: i32,
    },

    /// DigitalOcean API request was rejected.
    #[error("DigitalOcean API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or error message.
        message: String,
    },

    /// No droplet matched the given name or id.
    #[error("no droplet matching '{selector}'")]
    DropletNotFound {
        /// Name or id used for the lookup.
        selector: String,
    },

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem failure reading or writing the config.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is present but not valid JSON.
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, ProvisionError>;
