// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! The single entry point a host node's validation thread calls on
//! every block connect/disconnect (spec §9: "explicit context passing"
//! in place of the source's process-wide singletons).

use crate::deadpool::announce_db::AnnounceDb;
use crate::deadpool::index::{DeadpoolIndex, IndexBlock};
use crate::deadpool::tx::OutPoint;
use crate::params::ConsensusParams;
use crate::script::{
    check_deadpool_integer, extract_announce_fields, extract_entry_n, solve_deadpool_script, verify_claim_spend,
    TxoutType,
};
use std::sync::Arc;

pub trait ChainNotify {
    fn on_connect(&self, block: &IndexBlock) -> Result<(), crate::error::Error>;
    fn on_disconnect(&self, block: &IndexBlock, prev_best: Option<(u64, [u8; 32])>) -> Result<(), crate::error::Error>;
}

/// Drives both [`DeadpoolIndex`] (spec §4.7) and [`AnnounceDb`] (spec
/// §4.8) from one pass over a block's transactions, preserving the
/// ordering guarantee of spec §5: `OP_ANNOUNCEVERIFY` at height H reads
/// exactly the state committed by blocks `0..H-1`. This is also the one
/// place `OP_CHECKDIVVERIFY`/`OP_ANNOUNCEVERIFY` actually run against a
/// connecting block (spec §8 invariant 7/8) — the index and announce DB
/// are bookkeeping, not the consensus check itself.
pub struct DeadpoolConnector {
    pub index: Arc<DeadpoolIndex>,
    pub announce_db: Arc<AnnounceDb>,
    pub params: ConsensusParams,
}

impl DeadpoolConnector {
    pub fn new(index: Arc<DeadpoolIndex>, announce_db: Arc<AnnounceDb>, params: ConsensusParams) -> Self {
        Self { index, announce_db, params }
    }
}

impl ChainNotify for DeadpoolConnector {
    fn on_connect(&self, block: &IndexBlock) -> Result<(), crate::error::Error> {
        tracing::debug!(height = block.height, "connecting deadpool block");

        // Reject before writing anything: an invalid entry or claim
        // fails the whole block connect, not just its own output/input.
        for tx in &block.txs {
            for txout in &tx.outputs {
                if solve_deadpool_script(&txout.script_pubkey) == TxoutType::DeadpoolEntry {
                    let n_bytes = extract_entry_n(&txout.script_pubkey).expect("matched entry template");
                    check_deadpool_integer(n_bytes, u64::from(self.params.pow_limit), u64::from(self.params.pow_max_bits))?;
                }
            }
            for input in &tx.inputs {
                let Some(deadpool_id) = self.index.get_owner(input.prevout)? else { continue };
                let Some(entry) = self.index.get_entry(deadpool_id, input.prevout)? else { continue };
                verify_claim_spend(&entry.txout.script_pubkey, &input.script_sig, self.announce_db.as_ref(), &self.params)?;
            }
        }

        self.index.connect_block(block)?;

        for tx in &block.txs {
            for (vout, txout) in tx.outputs.iter().enumerate() {
                if solve_deadpool_script(&txout.script_pubkey) != TxoutType::DeadpoolAnnounce {
                    continue;
                }
                let (claim_hash, n_bytes) =
                    extract_announce_fields(&txout.script_pubkey).expect("matched announce template");
                let deadpool_id = crate::script::deadpool_id(n_bytes);
                let outpoint = OutPoint::new(tx.txid, vout as u32);
                let claim_hash: [u8; 32] = claim_hash.try_into().expect("announce template fixes hash to 32 bytes");
                self.announce_db.insert(deadpool_id, outpoint, block.height, claim_hash)?;
            }
        }
        self.announce_db.set_tip_height(block.height);
        Ok(())
    }

    fn on_disconnect(&self, block: &IndexBlock, prev_best: Option<(u64, [u8; 32])>) -> Result<(), crate::error::Error> {
        tracing::debug!(height = block.height, "disconnecting deadpool block");
        for tx in &block.txs {
            for (vout, txout) in tx.outputs.iter().enumerate() {
                if solve_deadpool_script(&txout.script_pubkey) != TxoutType::DeadpoolAnnounce {
                    continue;
                }
                let (_, n_bytes) = extract_announce_fields(&txout.script_pubkey).expect("matched announce template");
                let deadpool_id = crate::script::deadpool_id(n_bytes);
                let outpoint = OutPoint::new(tx.txid, vout as u32);
                self.announce_db.remove(deadpool_id, outpoint)?;
            }
        }
        self.index.disconnect_block(block, prev_best)?;
        self.announce_db.set_tip_height(prev_best.map(|(h, _)| h).unwrap_or(0));
        Ok(())
    }
}
