// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::actors::policy::Policy;
use crate::shim::version::NetworkVersion;

/// Default gas limit of a message when none is configured.
pub const BLOCK_GAS_LIMIT: i64 = 10_000_000_000;

/// Interpreter configuration. Every field has a default, so a partial TOML document is
/// accepted.
///
/// ```
/// # use forest_actor_vm::config::Config;
/// let config = Config::from_toml("network_name = \"devnet\"\n").unwrap();
/// assert_eq!(config.network_name, "devnet");
/// assert_eq!(config.gas_limit, 10_000_000_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name recorded by the Init actor at genesis.
    pub network_name: String,
    pub network_version: NetworkVersion,
    /// Gas limit applied to explicit messages.
    pub gas_limit: i64,
    pub policy: Policy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network_name: "mainnet".to_owned(),
            network_version: NetworkVersion::LATEST,
            gas_limit: BLOCK_GAS_LIMIT,
            policy: Policy::default(),
        }
    }
}

impl Config {
    pub fn from_toml(toml_string: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_string)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let toml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&toml).with_context(|| format!("invalid config file {}", path.display()))
    }
}
