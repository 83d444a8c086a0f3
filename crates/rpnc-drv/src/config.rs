//! Configuration file support.
//!
//! An optional `rpnc.toml` next to the project provides defaults for the
//! flags that rarely change between invocations; command-line arguments
//! always win over file values.
//!
//! ```toml
//! baud = 115200
//! nivel = "completo"
//! debug = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DriverError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "rpnc.toml";

/// Defaults loadable from `rpnc.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileConfig {
    /// UART baud rate for emitted assembly.
    #[serde(default = "default_baud")]
    pub baud: u32,

    /// Optimization level name (folding, propagation, dead_code, completo).
    #[serde(default = "default_nivel")]
    pub nivel: String,

    /// Emit debug prints in generated assembly.
    #[serde(default)]
    pub debug: bool,
}

fn default_baud() -> u32 {
    9600
}

fn default_nivel() -> String {
    "completo".to_string()
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            baud: default_baud(),
            nivel: default_nivel(),
            debug: false,
        }
    }
}

impl FileConfig {
    /// Loads a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| DriverError::io(path, e))?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads the explicit path when given, otherwise `rpnc.toml` from the
    /// working directory when present, otherwise the defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.exists() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FileConfig::default();
        assert_eq!(config.baud, 9600);
        assert_eq!(config.nivel, "completo");
        assert!(!config.debug);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: FileConfig = toml::from_str("baud = 115200").unwrap();
        assert_eq!(config.baud, 115_200);
        assert_eq!(config.nivel, "completo");
    }

    #[test]
    fn test_full_file() {
        let config: FileConfig =
            toml::from_str("baud = 115200\nnivel = \"folding\"\ndebug = true").unwrap();
        assert_eq!(config.nivel, "folding");
        assert!(config.debug);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let result: std::result::Result<FileConfig, _> = toml::from_str("baud = \"fast\"");
        assert!(result.is_err());
    }
}
