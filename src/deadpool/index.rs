// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! The RPC-facing deadpool index (spec §4.7): entries, announcements,
//! and claim state, each keyed by a one-byte table tag over a single
//! [`KvStore`].

use crate::deadpool::tx::{BlockHash, OutPoint, Txid, TxOut};
use crate::kvstore::{KvStore, WriteBatch};
use crate::script::{solve_deadpool_script, TxoutType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const ENTRY_PREFIX: u8 = b'd';
const ANNOUNCE_PREFIX: u8 = b'a';
const CLAIM_PREFIX: u8 = b'c';
/// Not one of spec §4.7's three tables: an auxiliary `outpoint ->
/// deadpoolId` map so `connect_block` can find which deadpool an input
/// being spent belongs to without scanning every entry. Populated
/// alongside every `d|` write, consulted (never iterated) on spend.
const OWNER_PREFIX: u8 = b'o';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub deadpool_id: [u8; 32],
    pub outpoint: OutPoint,
    pub height: u64,
    pub txout: TxOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub entry_outpoint: OutPoint,
    pub deadpool_id: [u8; 32],
    pub claim_height: u64,
    pub claim_block_hash: BlockHash,
    pub claim_tx_hash: Txid,
    pub solution_bytes: Vec<u8>,
}

impl ClaimRecord {
    fn unclaimed(entry_outpoint: OutPoint, deadpool_id: [u8; 32]) -> Self {
        Self {
            entry_outpoint,
            deadpool_id,
            claim_height: 0,
            claim_block_hash: [0u8; 32],
            claim_tx_hash: [0u8; 32],
            solution_bytes: Vec::new(),
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.claim_height != 0
    }
}

/// One transaction input: the outpoint it spends and the scriptSig
/// revealing a claim's solution, when the prevout is a deadpool entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    pub prevout: OutPoint,
    pub script_sig: Vec<u8>,
}

/// Minimal transaction/block shape the index connects against — the
/// surrounding node's real types satisfy this by projection.
pub struct IndexTx {
    pub txid: Txid,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
}

pub struct IndexBlock {
    pub hash: BlockHash,
    pub height: u64,
    pub txs: Vec<IndexTx>,
}

fn entry_key(deadpool_id: [u8; 32], outpoint: OutPoint) -> Vec<u8> {
    let mut key = vec![ENTRY_PREFIX];
    key.extend_from_slice(&deadpool_id);
    key.extend_from_slice(&outpoint.to_key_bytes());
    key
}

fn announce_key(deadpool_id: [u8; 32], outpoint: OutPoint) -> Vec<u8> {
    let mut key = vec![ANNOUNCE_PREFIX];
    key.extend_from_slice(&deadpool_id);
    key.extend_from_slice(&outpoint.to_key_bytes());
    key
}

fn claim_key(outpoint: OutPoint, deadpool_id: [u8; 32]) -> Vec<u8> {
    let mut key = vec![CLAIM_PREFIX];
    key.extend_from_slice(&outpoint.to_key_bytes());
    key.extend_from_slice(&deadpool_id);
    key
}

fn owner_key(outpoint: OutPoint) -> Vec<u8> {
    let mut key = vec![OWNER_PREFIX];
    key.extend_from_slice(&outpoint.to_key_bytes());
    key
}

const BEST_BLOCK_KEY: &[u8] = b"best_block";

pub struct DeadpoolIndex {
    store: Arc<dyn KvStore>,
}

impl DeadpoolIndex {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn best_block(&self) -> Result<Option<(u64, BlockHash)>, crate::error::Error> {
        let Some(bytes) = self.store.get(BEST_BLOCK_KEY)? else {
            return Ok(None);
        };
        let (height, hash): (u64, BlockHash) = serde_json::from_slice(&bytes).map_err(|e| crate::error::Error::Other(e.to_string()))?;
        Ok(Some((height, hash)))
    }

    /// Connect one block: classify every output, write entries and
    /// announcements, open unclaimed claim records, and resolve spends
    /// against the `o|` owner map (spec §4.7 "On block connect").
    pub fn connect_block(&self, block: &IndexBlock) -> Result<(), crate::error::Error> {
        let mut batch = WriteBatch::default();

        for tx in &block.txs {
            for (vout, txout) in tx.outputs.iter().enumerate() {
                let outpoint = OutPoint::new(tx.txid, vout as u32);
                match solve_deadpool_script(&txout.script_pubkey) {
                    TxoutType::DeadpoolEntry => {
                        let n_bytes = crate::script::extract_entry_n(&txout.script_pubkey).expect("matched entry template");
                        let deadpool_id = crate::script::deadpool_id(n_bytes);
                        let entry = IndexEntry { deadpool_id, outpoint, height: block.height, txout: txout.clone() };
                        batch.put(entry_key(deadpool_id, outpoint), serde_json::to_vec(&entry).expect("serializable"));
                        batch.put(owner_key(outpoint), deadpool_id.to_vec());
                        let record = ClaimRecord::unclaimed(outpoint, deadpool_id);
                        batch.put(claim_key(outpoint, deadpool_id), serde_json::to_vec(&record).expect("serializable"));
                    }
                    TxoutType::DeadpoolAnnounce => {
                        let (_, n_bytes) = crate::script::extract_announce_fields(&txout.script_pubkey)
                            .expect("matched announce template");
                        let deadpool_id = crate::script::deadpool_id(n_bytes);
                        let entry = IndexEntry { deadpool_id, outpoint, height: block.height, txout: txout.clone() };
                        batch.put(announce_key(deadpool_id, outpoint), serde_json::to_vec(&entry).expect("serializable"));
                    }
                    TxoutType::Other => {}
                }
            }

            for input in &tx.inputs {
                if let Some(owner_bytes) = self.store.get(&owner_key(input.prevout))? {
                    let deadpool_id: [u8; 32] = owner_bytes.try_into().map_err(|_| {
                        crate::error::Error::Other("corrupt owner record".to_string())
                    })?;
                    let key = claim_key(input.prevout, deadpool_id);
                    if let Some(existing) = self.store.get(&key)? {
                        let mut record: ClaimRecord = serde_json::from_slice(&existing)
                            .map_err(|e| crate::error::Error::Other(e.to_string()))?;
                        record.claim_height = block.height;
                        record.claim_block_hash = block.hash;
                        record.claim_tx_hash = tx.txid;
                        record.solution_bytes = crate::script::parse_claim_script_sig(&input.script_sig)
                            .map(|(_, p_bytes)| p_bytes.to_vec())
                            .unwrap_or_default();
                        batch.put(key, serde_json::to_vec(&record).expect("serializable"));
                    }
                }
            }
        }

        batch.put(BEST_BLOCK_KEY.to_vec(), serde_json::to_vec(&(block.height, block.hash)).expect("serializable"));
        self.store.commit(batch)?;
        Ok(())
    }

    /// Invert every write `connect_block` performed at this height (spec
    /// §4.7 "On block disconnect").
    pub fn disconnect_block(&self, block: &IndexBlock, prev: Option<(u64, BlockHash)>) -> Result<(), crate::error::Error> {
        let mut batch = WriteBatch::default();

        for tx in &block.txs {
            for (vout, txout) in tx.outputs.iter().enumerate() {
                let outpoint = OutPoint::new(tx.txid, vout as u32);
                match solve_deadpool_script(&txout.script_pubkey) {
                    TxoutType::DeadpoolEntry => {
                        let n_bytes = crate::script::extract_entry_n(&txout.script_pubkey).expect("matched entry template");
                        let deadpool_id = crate::script::deadpool_id(n_bytes);
                        batch.delete(entry_key(deadpool_id, outpoint));
                        batch.delete(owner_key(outpoint));
                        batch.delete(claim_key(outpoint, deadpool_id));
                    }
                    TxoutType::DeadpoolAnnounce => {
                        let (_, n_bytes) = crate::script::extract_announce_fields(&txout.script_pubkey)
                            .expect("matched announce template");
                        let deadpool_id = crate::script::deadpool_id(n_bytes);
                        batch.delete(announce_key(deadpool_id, outpoint));
                    }
                    TxoutType::Other => {}
                }
            }

            for input in &tx.inputs {
                if let Some(owner_bytes) = self.store.get(&owner_key(input.prevout))? {
                    let deadpool_id: [u8; 32] = owner_bytes.try_into().map_err(|_| {
                        crate::error::Error::Other("corrupt owner record".to_string())
                    })?;
                    let key = claim_key(input.prevout, deadpool_id);
                    if let Some(existing) = self.store.get(&key)? {
                        let mut record: ClaimRecord = serde_json::from_slice(&existing)
                            .map_err(|e| crate::error::Error::Other(e.to_string()))?;
                        record.claim_height = 0;
                        record.claim_block_hash = [0u8; 32];
                        record.claim_tx_hash = [0u8; 32];
                        record.solution_bytes.clear();
                        batch.put(key, serde_json::to_vec(&record).expect("serializable"));
                    }
                }
            }
        }

        match prev {
            Some(p) => batch.put(BEST_BLOCK_KEY.to_vec(), serde_json::to_vec(&p).expect("serializable")),
            None => batch.delete(BEST_BLOCK_KEY.to_vec()),
        }
        self.store.commit(batch)?;
        Ok(())
    }

    pub fn get_entry(&self, deadpool_id: [u8; 32], outpoint: OutPoint) -> Result<Option<IndexEntry>, crate::error::Error> {
        match self.store.get(&entry_key(deadpool_id, outpoint))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(|e| crate::error::Error::Other(e.to_string()))?)),
            None => Ok(None),
        }
    }

    /// `deadpoolId` owning `outpoint`, if it's an entry the index has
    /// seen — consulted by the connector to find the entry script a
    /// spending input's scriptSig must verify against.
    pub fn get_owner(&self, outpoint: OutPoint) -> Result<Option<[u8; 32]>, crate::error::Error> {
        match self.store.get(&owner_key(outpoint))? {
            Some(bytes) => {
                let id: [u8; 32] =
                    bytes.try_into().map_err(|_| crate::error::Error::Other("corrupt owner record".to_string()))?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Every entry across all deadpool ids within the last `num_blocks`
    /// of the index's saved tip, most recent first, capped at `limit` —
    /// backs `listdeadpoolentries` (spec §6), which has no single
    /// `deadpoolId` to scope a `d|`-prefixed scan to.
    pub fn list_all_entries(&self, num_blocks: u64, limit: usize) -> Result<Vec<IndexEntry>, crate::error::Error> {
        let tip_height = self.best_block()?.map(|(h, _)| h).unwrap_or(0);
        let min_height = tip_height.saturating_sub(num_blocks);
        let mut entries: Vec<IndexEntry> = self
            .store
            .scan_prefix(&[ENTRY_PREFIX])?
            .into_iter()
            .map(|(_, v)| serde_json::from_slice::<IndexEntry>(&v).map_err(|e| crate::error::Error::Other(e.to_string())))
            .collect::<Result<_, _>>()?;
        entries.retain(|e| e.height >= min_height);
        entries.sort_by(|a, b| b.height.cmp(&a.height));
        entries.truncate(limit);
        Ok(entries)
    }

    pub fn list_entries(&self, deadpool_id: [u8; 32]) -> Result<Vec<IndexEntry>, crate::error::Error> {
        let mut prefix = vec![ENTRY_PREFIX];
        prefix.extend_from_slice(&deadpool_id);
        self.store
            .scan_prefix(&prefix)?
            .into_iter()
            .map(|(_, v)| serde_json::from_slice(&v).map_err(|e| crate::error::Error::Other(e.to_string())))
            .collect()
    }

    pub fn list_announcements(&self, deadpool_id: [u8; 32]) -> Result<Vec<IndexEntry>, crate::error::Error> {
        let mut prefix = vec![ANNOUNCE_PREFIX];
        prefix.extend_from_slice(&deadpool_id);
        self.store
            .scan_prefix(&prefix)?
            .into_iter()
            .map(|(_, v)| serde_json::from_slice(&v).map_err(|e| crate::error::Error::Other(e.to_string())))
            .collect()
    }

    pub fn get_claim(&self, outpoint: OutPoint, deadpool_id: [u8; 32]) -> Result<Option<ClaimRecord>, crate::error::Error> {
        match self.store.get(&claim_key(outpoint, deadpool_id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(|e| crate::error::Error::Other(e.to_string()))?)),
            None => Ok(None),
        }
    }

    /// Drive `connect_block` for every block the notifier has that the
    /// index hasn't seen yet (spec §4.7: "must catch up from its saved
    /// best-block if the node restarts with a higher tip").
    pub fn catch_up(&self, blocks: impl IntoIterator<Item = IndexBlock>) -> Result<(), crate::error::Error> {
        let resume_height = self.best_block()?.map(|(h, _)| h + 1).unwrap_or(0);
        for block in blocks {
            if block.height < resume_height {
                continue;
            }
            tracing::info!(height = block.height, "deadpool index catching up");
            self.connect_block(&block)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kvstore::MemStore;
    use crate::script::{build_deadpool_entry_script, deadpool_id};

    fn entry_block(height: u64, n: i64, bounty: u64) -> (IndexBlock, [u8; 32], OutPoint) {
        let n_bytes = crate::bigint::BigInt::from(n).to_signed_bytes();
        let id = deadpool_id(&n_bytes);
        let txid = [height as u8; 32];
        let outpoint = OutPoint::new(txid, 0);
        let block = IndexBlock {
            hash: [height as u8 + 1; 32],
            height,
            txs: vec![IndexTx {
                txid,
                inputs: vec![],
                outputs: vec![TxOut { value: bounty, script_pubkey: build_deadpool_entry_script(&n_bytes) }],
            }],
        };
        (block, id, outpoint)
    }

    #[test]
    fn connect_then_list_entry() {
        let index = DeadpoolIndex::new(Arc::new(MemStore::new()));
        let (block, id, outpoint) = entry_block(10, 143, 5_000_000);
        index.connect_block(&block).unwrap();

        let entries = index.list_entries(id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].outpoint, outpoint);

        let claim = index.get_claim(outpoint, id).unwrap().unwrap();
        assert!(!claim.is_claimed());
        assert_eq!(index.best_block().unwrap(), Some((10, block.hash)));
    }

    #[test]
    fn spend_marks_claim_record_claimed() {
        let index = DeadpoolIndex::new(Arc::new(MemStore::new()));
        let (entry_blk, id, outpoint) = entry_block(10, 143, 5_000_000);
        index.connect_block(&entry_blk).unwrap();

        let claim_txid = [99u8; 32];
        let claim_block = IndexBlock {
            hash: [100u8; 32],
            height: 11,
            txs: vec![IndexTx { txid: claim_txid, inputs: vec![TxIn { prevout: outpoint, script_sig: vec![] }], outputs: vec![] }],
        };
        index.connect_block(&claim_block).unwrap();

        let claim = index.get_claim(outpoint, id).unwrap().unwrap();
        assert!(claim.is_claimed());
        assert_eq!(claim.claim_height, 11);
        assert_eq!(claim.claim_tx_hash, claim_txid);
    }

    #[test]
    fn get_owner_resolves_an_entry_outpoint_and_nothing_else() {
        let index = DeadpoolIndex::new(Arc::new(MemStore::new()));
        let (block, id, outpoint) = entry_block(10, 143, 5_000_000);
        index.connect_block(&block).unwrap();

        assert_eq!(index.get_owner(outpoint).unwrap(), Some(id));
        let other = OutPoint::new([7u8; 32], 3);
        assert_eq!(index.get_owner(other).unwrap(), None);
    }

    #[test]
    fn list_all_entries_spans_ids_and_respects_the_height_window_and_limit() {
        let index = DeadpoolIndex::new(Arc::new(MemStore::new()));
        let (block_a, id_a, outpoint_a) = entry_block(10, 143, 1_000_000);
        let (block_b, id_b, _) = entry_block(20, 91, 2_000_000);
        index.connect_block(&block_a).unwrap();
        index.connect_block(&block_b).unwrap();

        let all = index.list_all_entries(1_000, 10).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].height, 20);
        assert_eq!(all[0].deadpool_id, id_b);
        assert_eq!(all[1].deadpool_id, id_a);
        assert_eq!(all[1].outpoint, outpoint_a);

        // Tip is 20; a 5-block window excludes the height-10 entry.
        let windowed = index.list_all_entries(5, 10).unwrap();
        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed[0].deadpool_id, id_b);

        let limited = index.list_all_entries(1_000, 1).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].deadpool_id, id_b);
    }

    #[test]
    fn connect_then_disconnect_is_byte_identical() {
        let store = Arc::new(MemStore::new());
        let index = DeadpoolIndex::new(store);
        let (block, id, outpoint) = entry_block(10, 143, 5_000_000);
        index.connect_block(&block).unwrap();
        index.disconnect_block(&block, None).unwrap();

        assert!(index.list_entries(id).unwrap().is_empty());
        assert_eq!(index.get_claim(outpoint, id).unwrap(), None);
        assert_eq!(index.best_block().unwrap(), None);
    }
}
