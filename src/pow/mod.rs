// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! Proof-of-work: seed derivation, validation, and retargeting (spec.md
//! §4.2–§4.4), split into one file per concern the way forest splits
//! `blockchain/chain_sync` into its constituent stages.

pub mod ghash;
pub mod retarget;
pub mod validate;

pub use ghash::{ghash, GhashScratch, W_BYTES};
pub use retarget::next_work_required;
pub use validate::{check_proof_of_work, derive_n, verify_semiprime};
