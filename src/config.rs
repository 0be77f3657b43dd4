//! Configuration file parsing for Bridgewire
//!
//! Parses `bridgewire.toml` configuration files using serde

use crate::error::{Error, Result};
use crate::network::ifname::{IfName, NamePolicy};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;

/// Load configuration from a file
pub fn load(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content)?;
    config.validate()?;

    Ok(config)
}

/// Load configuration, falling back to defaults when the file does not exist
pub fn load_or_default(path: &Path) -> Result<Config> {
    match load(path) {
        Err(Error::ConfigRead { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            Ok(Config::default())
        }
        other => other,
    }
}

/// Root configuration structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Interface name handling
    #[serde(default)]
    pub names: NamesConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Declared bridges for `up`/`down`
    #[serde(default)]
    pub bridges: Vec<BridgeDef>,
}

/// Interface name handling
#[derive(Debug, Default, Deserialize)]
pub struct NamesConfig {
    /// Truncate or reject names longer than 15 bytes
    #[serde(default)]
    pub policy: NamePolicy,
}

/// Log output settings
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is unset
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// A declared bridge
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeDef {
    /// Bridge device name
    pub name: String,

    /// Interfaces to attach
    #[serde(default)]
    pub members: Vec<String>,

    /// Bring the bridge up after wiring it
    #[serde(default)]
    pub up: bool,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(Error::ConfigValidation(format!(
                "Unknown log level: {}",
                self.logging.level
            )));
        }

        let policy = self.names.policy;
        let mut bridges = HashSet::new();
        let mut owners: HashMap<String, &str> = HashMap::new();

        for bridge in &self.bridges {
            let name = check_name(&bridge.name, policy)?;
            if !bridges.insert(name.clone()) {
                return Err(Error::ConfigValidation(format!(
                    "Duplicate bridge name: {}",
                    bridge.name
                )));
            }

            for member in &bridge.members {
                let member_name = check_name(member, policy)?;
                if member_name == name {
                    return Err(Error::ConfigValidation(format!(
                        "Bridge '{}' lists itself as a member",
                        bridge.name
                    )));
                }
                if let Some(owner) = owners.insert(member_name, &bridge.name) {
                    return Err(Error::ConfigValidation(format!(
                        "Interface '{}' is a member of both '{}' and '{}'",
                        member, owner, bridge.name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Normalise a declared name the way the manager will
fn check_name(name: &str, policy: NamePolicy) -> Result<String> {
    IfName::with_policy(name, policy)
        .map(|n| n.to_string())
        .map_err(|e| Error::ConfigValidation(e.to_string()))
}
