pub mod config;
pub mod config_loader;

pub use config::{AppConfig, PollerConfig, RetryConfig, SnitchConfig};
pub use config_loader::ConfigLoader;
