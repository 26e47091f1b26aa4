use std::{fmt, str::FromStr};

use solana_address::Address;

use crate::{
    constants::{parse_address, SQUADS_PROGRAM_ID},
    errors::SquadsError,
};

pub const MAINNET_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEVNET_URL: &str = "https://api.devnet.solana.com";
pub const LOCALNET_URL: &str = "http://localhost:8899";

pub const CLUSTER_ENV: &str = "SQUADS_CLUSTER";
pub const PROGRAM_ID_ENV: &str = "SQUADS_PROGRAM_ID";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Cluster {
    #[default]
    Mainnet,
    Devnet,
    Localnet,
    Custom(String),
}

impl Cluster {
    pub fn url(&self) -> &str {
        match self {
            Cluster::Mainnet => MAINNET_URL,
            Cluster::Devnet => DEVNET_URL,
            Cluster::Localnet => LOCALNET_URL,
            Cluster::Custom(url) => url,
        }
    }
}

impl FromStr for Cluster {
    type Err = SquadsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(Cluster::Mainnet),
            "devnet" => Ok(Cluster::Devnet),
            "localnet" | "localhost" => Ok(Cluster::Localnet),
            lower if lower.starts_with("http://") || lower.starts_with("https://") => {
                Ok(Cluster::Custom(s.to_string()))
            }
            _ => Err(SquadsError::UnknownCluster(s.to_string())),
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cluster::Mainnet => f.write_str("mainnet"),
            Cluster::Devnet => f.write_str("devnet"),
            Cluster::Localnet => f.write_str("localnet"),
            Cluster::Custom(url) => f.write_str(url),
        }
    }
}

/// Where squads are read from and which program owns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub cluster: Cluster,
    pub program_id: Address,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ClientConfig {
    pub fn new(cluster: Cluster) -> Self {
        Self {
            cluster,
            program_id: SQUADS_PROGRAM_ID,
        }
    }

    pub fn mainnet() -> Self {
        Self::new(Cluster::Mainnet)
    }

    pub fn devnet() -> Self {
        Self::new(Cluster::Devnet)
    }

    pub fn localnet() -> Self {
        Self::new(Cluster::Localnet)
    }

    pub fn with_program_id(mut self, program_id: Address) -> Self {
        self.program_id = program_id;
        self
    }

    /// Reads `SQUADS_CLUSTER` and `SQUADS_PROGRAM_ID`; unset variables keep
    /// the mainnet defaults.
    pub fn from_env() -> Result<Self, SquadsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<L>(lookup: L) -> Result<Self, SquadsError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(cluster) = lookup(CLUSTER_ENV).filter(|value| !value.trim().is_empty()) {
            config.cluster = cluster.parse()?;
        }
        if let Some(program_id) = lookup(PROGRAM_ID_ENV).filter(|value| !value.trim().is_empty()) {
            config.program_id = parse_address(&program_id)?;
        }
        Ok(config)
    }
}
