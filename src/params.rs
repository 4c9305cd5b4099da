// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! Per-network consensus parameters (spec §6 "Consensus parameters").
//!
//! Mirrors forest's one-struct-per-network convention
//! (`networks::mainnet`, `networks::calibnet`) rather than a single struct
//! with network-conditional branches scattered through the code.

use crate::softfork::Deployment;
use serde::{Deserialize, Serialize};

pub const COIN: u64 = 100_000_000;

/// Largest coin multiple that fits in a positive `i64` number of satoshi.
pub const MAX_MONEY: i64 = 46_116_860_184 * COIN as i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::EnumString, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    pub network: Network,

    /// Target spacing between blocks, in seconds.
    pub pow_target_spacing: u32,
    /// Retarget window, in seconds (14 days on mainnet).
    pub pow_target_timespan: u32,
    /// Minimum allowed `nBits` — the semiprime bit-length floor.
    pub pow_limit: u16,
    /// Hard ceiling on `nBits`; the 1024-bit `nP1` type cannot represent a
    /// factor half this large or larger (spec §9 design note).
    pub pow_max_bits: u16,
    /// Genesis `nBits`.
    pub pow_genesis_bits: u16,

    pub miller_rabin_rounds: u32,
    pub hash_rounds: u32,

    pub deadpool_announce_maturity: u64,
    pub deadpool_announce_validity: u64,
    pub deadpool_announce_min_burn: u64,

    /// Testnet-only: if the last block took more than twice the target
    /// spacing, the next block may be mined at `pow_limit`.
    pub allow_min_difficulty_blocks: bool,

    pub deadpool_softfork: Deployment,
}

impl ConsensusParams {
    pub fn retarget_interval(&self) -> u64 {
        (self.pow_target_timespan / self.pow_target_spacing) as u64
    }

    pub fn mainnet() -> Self {
        Self {
            network: Network::Mainnet,
            pow_target_spacing: 30 * 60,
            pow_target_timespan: 14 * 24 * 60 * 60,
            pow_limit: 230,
            pow_max_bits: 1024,
            pow_genesis_bits: 230,
            miller_rabin_rounds: 50,
            hash_rounds: 1,
            deadpool_announce_maturity: 100,
            deadpool_announce_validity: 672,
            deadpool_announce_min_burn: COIN / 100,
            allow_min_difficulty_blocks: false,
            deadpool_softfork: Deployment::mainnet_deadpool(),
        }
    }

    pub fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            allow_min_difficulty_blocks: true,
            deadpool_softfork: Deployment::always_active(),
            ..Self::mainnet()
        }
    }

    pub fn regtest() -> Self {
        Self {
            network: Network::Regtest,
            pow_limit: 210,
            pow_genesis_bits: 210,
            allow_min_difficulty_blocks: true,
            deadpool_softfork: Deployment::always_active(),
            ..Self::mainnet()
        }
    }

    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self::mainnet(),
            Network::Testnet => Self::testnet(),
            Network::Regtest => Self::regtest(),
        }
    }

    /// Overlay values present in a TOML override file onto the network
    /// defaults — the same ambient role forest's node-config `toml` usage
    /// plays, letting an operator tune e.g. `miller_rabin_rounds` for a
    /// private testnet without a recompile.
    pub fn with_overrides(mut self, toml_str: &str) -> Result<Self, toml::de::Error> {
        let overrides: ConsensusParamOverrides = toml::from_str(toml_str)?;
        if let Some(v) = overrides.miller_rabin_rounds {
            self.miller_rabin_rounds = v;
        }
        if let Some(v) = overrides.deadpool_announce_maturity {
            self.deadpool_announce_maturity = v;
        }
        if let Some(v) = overrides.deadpool_announce_validity {
            self.deadpool_announce_validity = v;
        }
        if let Some(v) = overrides.deadpool_announce_min_burn {
            self.deadpool_announce_min_burn = v;
        }
        Ok(self)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConsensusParamOverrides {
    miller_rabin_rounds: Option<u32>,
    deadpool_announce_maturity: Option<u64>,
    deadpool_announce_validity: Option<u64>,
    deadpool_announce_min_burn: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_money_fits_i64() {
        assert!(MAX_MONEY > 0);
        assert!(i64::try_from(MAX_MONEY).is_ok());
    }

    #[test]
    fn network_round_trips_through_its_kebab_case_name() {
        use std::str::FromStr;
        assert_eq!(Network::Testnet.to_string(), "testnet");
        assert_eq!(Network::from_str("regtest").unwrap(), Network::Regtest);
    }

    #[test]
    fn overrides_apply_selectively() {
        let params = ConsensusParams::mainnet()
            .with_overrides("miller_rabin_rounds = 64\n")
            .unwrap();
        assert_eq!(params.miller_rabin_rounds, 64);
        assert_eq!(params.deadpool_announce_maturity, 100);
    }
}
