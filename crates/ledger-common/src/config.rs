//! The on-disk node configuration, deserialized from TOML by `ledgerd`. The
//! shape mirrors the account-model config crate: a top-level struct nesting
//! one section per subsystem, each independently `Deserialize`.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct GenesisConfig {
    /// Hex-encoded 32-byte genesis account public key.
    pub account: String,
    /// Hex-encoded 32-byte genesis representative. Defaults to `account`
    /// when omitted.
    pub representative: Option<String>,
    pub supply: u128,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub datadir: PathBuf,
    #[serde(default = "default_unchecked_capacity")]
    pub unchecked_capacity: usize,
}

fn default_unchecked_capacity() -> usize {
    65_536
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusConfig {
    /// Minimum delay between two votes from the same representative on the
    /// same qualified root, in milliseconds.
    #[serde(default = "default_vote_cooldown_ms")]
    pub vote_cooldown_ms: u64,
    /// Representative stake below which the weight table falls back to the
    /// bootstrap seed instead of the live aggregate.
    #[serde(default = "default_bootstrap_weight_max_blocks")]
    pub bootstrap_weight_max_blocks: u64,
}

fn default_vote_cooldown_ms() -> u64 {
    15_000
}

fn default_bootstrap_weight_max_blocks() -> u64 {
    450_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub genesis: GenesisConfig,
    pub store: StoreConfig,
    #[serde(default = "ConsensusConfig::default_values")]
    pub consensus: ConsensusConfig,
}

impl ConsensusConfig {
    fn default_values() -> ConsensusConfig {
        ConsensusConfig {
            vote_cooldown_ms: default_vote_cooldown_ms(),
            bootstrap_weight_max_blocks: default_bootstrap_weight_max_blocks(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml() {
        let raw = r#"
            [genesis]
            account = "00"
            supply = 1000

            [store]
            datadir = "/tmp/ledgerd"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.genesis.supply, 1000);
        assert_eq!(config.store.unchecked_capacity, 65_536);
        assert_eq!(config.consensus.vote_cooldown_ms, 15_000);
    }
}
