use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_CURRENCY_SYMBOL, DEFAULT_DATA_FILE, DEFAULT_LISTEN_ADDRESS};

/// Backend configuration, read from YAML. Every field has a default so an
/// empty (or absent) file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            data_file: default_data_file(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

fn default_listen_address() -> String {
    DEFAULT_LISTEN_ADDRESS.to_string()
}

fn default_data_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_FILE)
}

fn default_currency_symbol() -> String {
    DEFAULT_CURRENCY_SYMBOL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config: Configuration = serde_yaml::from_str("data_file: /var/lib/sim/data.xml\n").unwrap();
        assert_eq!(config.data_file, PathBuf::from("/var/lib/sim/data.xml"));
        assert_eq!(config.listen_address, "127.0.0.1:5000");
        assert_eq!(config.currency_symbol, "Q");
    }

    #[test]
    fn full_yaml() {
        let yaml = r#"
listen_address: 0.0.0.0:8080
data_file: store.xml
currency_symbol: "$"
"#;
        let config: Configuration = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.listen_address, "0.0.0.0:8080");
        assert_eq!(config.currency_symbol, "$");
    }
}
