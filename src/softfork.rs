// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! Versionbits-style deployment activation (spec §6 "Softfork activation"),
//! modeled the way forest's network-parameter modules gate features behind
//! a height table — here a small BIP9-shaped state machine instead, since
//! the deployment is time- and height-gated rather than epoch-gated.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentState {
    Defined,
    Started,
    LockedIn,
    Active,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub bit: u8,
    /// Median-time-past at which signaling begins.
    pub start_time: u64,
    /// Median-time-past after which, if not locked in, the deployment fails.
    pub timeout: u64,
    /// A block below this height can never be `Active`, regardless of
    /// signaling — spec §6's `min-activation height 155000`.
    pub min_activation_height: u32,
    /// If true, the deployment reports `Active` unconditionally (testnet
    /// and regtest, per spec §6).
    pub always_active: bool,
}

impl Deployment {
    pub fn mainnet_deadpool() -> Self {
        Self {
            bit: 27,
            start_time: 1_735_689_600, // 2025-01-01T00:00:00Z
            timeout: 1_748_736_000,    // 2025-06-01T00:00:00Z
            min_activation_height: 155_000,
            always_active: false,
        }
    }

    pub fn always_active() -> Self {
        Self { bit: 27, start_time: 0, timeout: 0, min_activation_height: 0, always_active: true }
    }

    /// Evaluate deployment state at `height` with median-time-past `mtp`
    /// and `signaling_ratio` — the fraction of the last retarget window's
    /// blocks that set this deployment's bit, already computed by the host
    /// node's signaling tally (out of scope here, per spec §1).
    pub fn state_at(&self, height: u32, mtp: u64, signaling_ratio: f64) -> DeploymentState {
        if self.always_active {
            return DeploymentState::Active;
        }
        if height < self.min_activation_height {
            return if mtp < self.start_time { DeploymentState::Defined } else { DeploymentState::Started };
        }
        if mtp < self.start_time {
            return DeploymentState::Defined;
        }
        if signaling_ratio >= 0.95 {
            return DeploymentState::Active;
        }
        if mtp >= self.timeout {
            return DeploymentState::Failed;
        }
        DeploymentState::Started
    }

    pub fn is_active(&self, height: u32, mtp: u64, signaling_ratio: f64) -> bool {
        matches!(self.state_at(height, mtp, signaling_ratio), DeploymentState::Active | DeploymentState::LockedIn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testnet_is_always_active() {
        let d = Deployment::always_active();
        assert!(d.is_active(0, 0, 0.0));
    }

    #[test]
    fn below_min_activation_height_never_active() {
        let d = Deployment::mainnet_deadpool();
        assert!(!d.is_active(100, d.timeout + 1, 1.0));
    }

    #[test]
    fn before_start_time_is_defined() {
        let d = Deployment::mainnet_deadpool();
        assert_eq!(d.state_at(200_000, d.start_time - 1, 0.0), DeploymentState::Defined);
    }

    #[test]
    fn high_signaling_activates() {
        let d = Deployment::mainnet_deadpool();
        assert_eq!(d.state_at(200_000, d.start_time + 1, 0.99), DeploymentState::Active);
    }

    #[test]
    fn timeout_without_lockin_fails() {
        let d = Deployment::mainnet_deadpool();
        assert_eq!(d.state_at(200_000, d.timeout, 0.1), DeploymentState::Failed);
    }
}
