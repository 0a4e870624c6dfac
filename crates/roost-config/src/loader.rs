use std::path::{Path, PathBuf};

use tracing::{info, warn};

use roost_core::{Result, RoostError};

use crate::schema::RoostConfig;

/// Loads the Roost configuration from disk with env-var overrides.
pub struct ConfigLoader {
    config: RoostConfig,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > ROOST_CONFIG env >
    /// ~/.roost/roost.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("ROOST_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".roost")
            .join("roost.toml")
    }

    /// Load the config from disk, falling back to defaults when the file
    /// is absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            let raw = std::fs::read_to_string(&config_path)?;
            toml::from_str::<RoostConfig>(&raw).map_err(|e| {
                RoostError::Config(format!("failed to parse {}: {e}", config_path.display()))
            })?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            RoostConfig::default()
        };

        let config = Self::apply_env_overrides(config);

        // Warnings are logged; validation errors fail the load.
        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => return Err(RoostError::Config(e)),
        }

        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn get(&self) -> RoostConfig {
        self.config.clone()
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply env var overrides (ROOST_ENGINE_COMMAND, ROOST_STORE_PATH,
    /// ROOST_TIMEZONE, ROOST_LOG_LEVEL).
    fn apply_env_overrides(mut config: RoostConfig) -> RoostConfig {
        if let Ok(v) = std::env::var("ROOST_ENGINE_COMMAND") {
            config.engine.command = v;
        }
        if let Ok(v) = std::env::var("ROOST_STORE_PATH") {
            config.store.path = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("ROOST_TIMEZONE") {
            config.harness.timezone = v;
        }
        if let Ok(v) = std::env::var("ROOST_LOG_LEVEL") {
            config.logging.level = v;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let path = ConfigLoader::resolve_path(Some(Path::new("/tmp/custom.toml")));
        assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
    }

    #[test]
    fn test_env_override_applies() {
        unsafe { std::env::set_var("ROOST_ENGINE_COMMAND", "other-cli") };
        let config = ConfigLoader::apply_env_overrides(RoostConfig::default());
        unsafe { std::env::remove_var("ROOST_ENGINE_COMMAND") };
        assert_eq!(config.engine.command, "other-cli");
    }
}
