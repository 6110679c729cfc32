use std::{env, fs, io};

use common::configuration::Configuration;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "BILLING_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "./billing_config.yaml";
pub const BIND_ADDRESS_ENV: &str = "BIND_ADDRESS";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Load the YAML configuration.
///
/// The path is read from `BILLING_CONFIG_PATH` (env) or falls back to
/// `./billing_config.yaml`. A missing file yields the defaults, and
/// `BIND_ADDRESS` overrides the listen address either way.
pub fn load_config() -> Result<Configuration, SettingsError> {
    let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = load_config_from(&path)?;
    if let Ok(address) = env::var(BIND_ADDRESS_ENV) {
        config.listen_address = address;
    }
    Ok(config)
}

pub fn load_config_from(path: &str) -> Result<Configuration, SettingsError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Configuration::default()),
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_string(),
                source,
            })
        }
    };

    // An empty YAML document deserializes as unit, not as a map.
    if contents.trim().is_empty() {
        return Ok(Configuration::default());
    }

    serde_yaml::from_str(&contents).map_err(|source| SettingsError::Parse {
        path: path.to_string(),
        source,
    })
}
