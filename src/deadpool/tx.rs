// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! The narrow transaction vocabulary the deadpool logic is expressed
//! over (spec.md §1: "specifies only the interfaces the core consumes").
//! A full transaction/UTXO type belongs to the surrounding node.

use serde::{Deserialize, Serialize};

pub type Txid = [u8; 32];
pub type BlockHash = [u8; 32];

/// Amount in satoshi, mirroring `params::COIN`'s unit.
pub type Amount = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: Txid,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Txid, vout: u32) -> Self {
        Self { txid, vout }
    }

    /// Deterministic byte key for storage, matching the `(txid, vout)`
    /// ordering used throughout the index's key prefixes (spec §4.7).
    pub fn to_key_bytes(self) -> [u8; 36] {
        let mut out = [0u8; 36];
        out[..32].copy_from_slice(&self.txid);
        out[32..].copy_from_slice(&self.vout.to_be_bytes());
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: Amount,
    pub script_pubkey: Vec<u8>,
}

/// A host-supplied view of the UTXO set, queried by `OP_ANNOUNCEVERIFY`
/// and the RPC layer for balances and burn-amount checks (spec §1's
/// `CoinView` boundary).
pub trait CoinView {
    fn get_output(&self, outpoint: &OutPoint) -> Option<TxOut>;
}
