// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! The consensus-critical announcement database (spec §4.8): a single
//! `(deadpoolId, outpoint) -> (height, claimHash)` table, consulted
//! synchronously by [`crate::script::DeadpoolOp::AnnounceVerify`] and
//! kept in sync with the UTXO set. Never pruned; rebuildable only by a
//! full rescan.

use crate::deadpool::tx::{BlockHash, OutPoint};
use crate::kvstore::{KvStore, WriteBatch};
use crate::script::DeadpoolOpContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Record {
    height: u64,
    claim_hash: [u8; 32],
}

fn key(deadpool_id: [u8; 32], outpoint: OutPoint) -> Vec<u8> {
    let mut k = Vec::with_capacity(32 + 36);
    k.extend_from_slice(&deadpool_id);
    k.extend_from_slice(&outpoint.to_key_bytes());
    k
}

pub struct AnnounceDb {
    store: Arc<dyn KvStore>,
    tip_height: std::sync::atomic::AtomicU64,
}

impl AnnounceDb {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store, tip_height: std::sync::atomic::AtomicU64::new(0) }
    }

    pub fn set_tip_height(&self, height: u64) {
        self.tip_height.store(height, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn insert(&self, deadpool_id: [u8; 32], outpoint: OutPoint, height: u64, claim_hash: [u8; 32]) -> Result<(), crate::error::Error> {
        let mut batch = WriteBatch::default();
        let record = Record { height, claim_hash };
        batch.put(key(deadpool_id, outpoint), serde_json::to_vec(&record).expect("serializable"));
        self.store.commit(batch)?;
        Ok(())
    }

    pub fn remove(&self, deadpool_id: [u8; 32], outpoint: OutPoint) -> Result<(), crate::error::Error> {
        let mut batch = WriteBatch::default();
        batch.delete(key(deadpool_id, outpoint));
        self.store.commit(batch)?;
        Ok(())
    }

    /// `true` iff any record for `deadpool_id` carries `claim_hash`,
    /// returning its inclusion height — scans the deadpool's own
    /// records rather than a single outpoint, since spec §4.6 identifies
    /// the matching announcement by `claimHash`, not by its own outpoint
    /// (only its home entry's outpoint is known to the spender).
    pub fn find(&self, deadpool_id: [u8; 32], claim_hash: [u8; 32]) -> Result<Option<u64>, crate::error::Error> {
        for (k, v) in self.store.scan_prefix(&deadpool_id)? {
            if k.len() != 32 + 36 {
                continue;
            }
            let record: Record = serde_json::from_slice(&v).map_err(|e| crate::error::Error::Other(e.to_string()))?;
            if record.claim_hash == claim_hash {
                return Ok(Some(record.height));
            }
        }
        Ok(None)
    }

    /// Rebuild the database from scratch by replaying every announce
    /// output in `blocks`, in order — the only recovery path spec §4.8
    /// names if the database is lost, since it cannot be derived from
    /// the pruned UTXO set alone.
    pub fn rebuild_from_blocks(&self, blocks: impl IntoIterator<Item = (u64, BlockHash, Vec<([u8; 32], OutPoint, [u8; 32])>)>) -> Result<(), crate::error::Error> {
        let mut batch = WriteBatch::default();
        for (height, _hash, announcements) in blocks {
            for (deadpool_id, outpoint, claim_hash) in announcements {
                let record = Record { height, claim_hash };
                batch.put(key(deadpool_id, outpoint), serde_json::to_vec(&record).expect("serializable"));
            }
        }
        self.store.commit(batch)?;
        Ok(())
    }
}

impl DeadpoolOpContext for AnnounceDb {
    fn tip_height(&self) -> u64 {
        self.tip_height.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn find_announcement(&self, deadpool_id: [u8; 32], claim_hash: [u8; 32]) -> Option<u64> {
        self.find(deadpool_id, claim_hash).ok().flatten()
    }
}
