use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration from a TOML file, merging defaults
    /// and `COINTICK_`-prefixed environment variables.
    ///
    /// The file may be absent, in which case defaults and environment
    /// variables apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if an
    /// environment override has the wrong shape.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("COINTICK_").split("__"))
            .extract()?;

        Ok(config)
    }
}
