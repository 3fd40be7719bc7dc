use std::path::Path;

use crate::config::SpaConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};

/// Default location of the TOML configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/Spa.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    fn base() -> Figment {
        Figment::from(Serialized::defaults(SpaConfig::default()))
    }

    /// Loads the test configuration by layering defaults, TOML, environment variables, and JSON.
    ///
    /// Missing files are skipped; `SPA_`-prefixed variables (e.g. `SPA_BOOTSTRAP_REPLICATIONS`)
    /// override file values.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration source cannot be parsed.
    pub fn load() -> Result<SpaConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads the test configuration from a specific TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration source cannot be parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<SpaConfig> {
        let path = path.as_ref();
        let config: SpaConfig = Self::base()
            .merge(Toml::file(path))
            .merge(Env::prefixed("SPA_"))
            .join(Json::file("config/Spa.json"))
            .extract()?;

        tracing::debug!(path = %path.display(), ?config, "Loaded SPA configuration");
        Ok(config)
    }

    /// Loads the test configuration with a specific profile overlay (`config/Spa.{profile}.toml`).
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration source cannot be parsed.
    pub fn load_with_profile(profile: &str) -> Result<SpaConfig> {
        let config: SpaConfig = Self::base()
            .merge(Toml::file(DEFAULT_CONFIG_PATH))
            .merge(Toml::file(format!("config/Spa.{profile}.toml")))
            .merge(Env::prefixed("SPA_"))
            .join(Json::file("config/Spa.json"))
            .extract()?;

        tracing::debug!(profile, ?config, "Loaded SPA configuration profile");
        Ok(config)
    }
}
