//! Network profiles for the command-line tooling.
//!
//! Each named network points at the state file holding that network's
//! ledger and may carry a default caller identity. Without a config file a
//! single `localhost` network is available.

use std::{collections::BTreeMap, fs, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};

use crate::{caller::Caller, error::ConfigError};

/// Name of the network used when none is selected
pub const DEFAULT_NETWORK: &str = "localhost";

/// First account of a local development node
pub const DEFAULT_LOCAL_CALLER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// Settings for one deployment target
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Where this network's ledger state lives
    pub state_file: PathBuf,
    /// Identity to act as when none is given explicitly
    #[serde(default)]
    pub caller: Option<Caller>,
}

/// All known networks
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LedgerConfig {
    /// Network used when none is selected
    #[serde(default = "default_network")]
    pub default_network: String,
    /// Profiles by name
    pub networks: BTreeMap<String, NetworkConfig>,
}

/// Serde default for [`LedgerConfig::default_network`]
fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let localhost = NetworkConfig {
            state_file: PathBuf::from("ledger-localhost.json"),
            caller: Some(Caller::new(DEFAULT_LOCAL_CALLER)),
        };

        Self {
            default_network: default_network(),
            networks: BTreeMap::from([(DEFAULT_NETWORK.to_string(), localhost)]),
        }
    }
}

impl LedgerConfig {
    /// Read a config file
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

        serde_json::from_str(&contents)
            .map_err(|source| ConfigError::Decode { path: path.to_path_buf(), source })
    }

    /// Read `path` if given, otherwise use the built-in defaults
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a given file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    /// Pick a network profile, falling back to the default network
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownNetwork`] if no profile has that name.
    pub fn network(&self, name: Option<&str>) -> Result<Network, ConfigError> {
        let name = name.unwrap_or(self.default_network.as_str());
        self.networks
            .get(name)
            .map(|config| Network { name: name.to_string(), config: config.clone() })
            .ok_or_else(|| ConfigError::UnknownNetwork(name.to_string()))
    }
}

/// A selected network profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    /// Profile name
    pub name: String,
    /// Profile settings
    pub config: NetworkConfig,
}

impl Network {
    /// State file for this network
    #[must_use]
    pub fn state_file(&self) -> &Path {
        &self.config.state_file
    }

    /// Resolve who is making the call
    ///
    /// An explicit identity wins over the profile's default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCaller`] if neither is available.
    pub fn caller(&self, explicit: Option<Caller>) -> Result<Caller, ConfigError> {
        explicit
            .or_else(|| self.config.caller.clone())
            .ok_or_else(|| ConfigError::MissingCaller(self.name.clone()))
    }
}
