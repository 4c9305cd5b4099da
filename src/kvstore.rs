// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! A minimal key-value store abstraction, generalized from forest's
//! `db::{Read, Write}` trait split (`node/db/src/traits.rs`) into a single
//! object-safe trait so the deadpool index and announcement database can
//! share one backend-agnostic interface — an in-memory map in tests, a
//! `parity-db` instance in the real node.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot use unopened database")]
    Unopened,
    #[error(transparent)]
    Database(#[from] parity_db::Error),
    #[error("{0}")]
    Other(String),
}

/// One atomic batch of writes. Built up by a caller (e.g. a block
/// connector) and committed in one shot, so readers never observe a
/// partial update (spec §5's ordering guarantee).
#[derive(Default)]
pub struct WriteBatch {
    pub puts: Vec<(Vec<u8>, Vec<u8>)>,
    pub deletes: Vec<Vec<u8>>,
}

impl WriteBatch {
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.puts.push((key, value));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.deletes.push(key);
    }
}

pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Iterate all `(key, value)` pairs whose key starts with `prefix`, in
    /// key order. Readers use this for a consistent point-in-time scan
    /// (spec §5: "readers ... never block writers").
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;
}

/// In-memory backend used by unit and scenario tests.
#[derive(Default)]
pub struct MemStore {
    map: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.map.read().get(key).cloned())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut map = self.map.write();
        for (k, v) in batch.puts {
            map.insert(k, v);
        }
        for k in batch.deletes {
            map.remove(&k);
        }
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(self
            .map
            .read()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// `parity-db`-backed store used by the real node, one per on-disk index
/// (`indexes/deadpool/`, `announcedb/` — spec §6 "Persistent state layout").
pub struct ParityStore {
    db: parity_db::Db,
}

impl ParityStore {
    const COLUMN: u8 = 0;

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut options = parity_db::Options::with_columns(path, 1);
        options.columns[Self::COLUMN as usize].btree_index = true;
        let db = parity_db::Db::open_or_create(&options)?;
        Ok(Self { db })
    }
}

impl KvStore for ParityStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(Self::COLUMN.into(), key)?)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let col = u8::from(Self::COLUMN);
        let tx = batch
            .puts
            .into_iter()
            .map(|(k, v)| (col, k, Some(v)))
            .chain(batch.deletes.into_iter().map(|k| (col, k, None)));
        self.db.commit(tx)?;
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut out = Vec::new();
        let mut iter = self.db.iter(Self::COLUMN.into())?;
        iter.seek(prefix)?;
        while let Some((k, v)) = iter.next()? {
            if !k.starts_with(prefix) {
                break;
            }
            out.push((k, v));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_store_scan_prefix() {
        let store = MemStore::new();
        let mut batch = WriteBatch::default();
        batch.put(b"d\x01a".to_vec(), b"1".to_vec());
        batch.put(b"d\x01b".to_vec(), b"2".to_vec());
        batch.put(b"a\x01a".to_vec(), b"3".to_vec());
        store.commit(batch).unwrap();

        let scanned = store.scan_prefix(b"d\x01").unwrap();
        assert_eq!(scanned.len(), 2);
    }

    #[test]
    fn mem_store_delete() {
        let store = MemStore::new();
        let mut batch = WriteBatch::default();
        batch.put(b"k".to_vec(), b"v".to_vec());
        store.commit(batch).unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));

        let mut batch = WriteBatch::default();
        batch.delete(b"k".to_vec());
        store.commit(batch).unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
    }

    #[test]
    fn parity_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deadpool-index");

        {
            let store = ParityStore::open(&path).unwrap();
            let mut batch = WriteBatch::default();
            batch.put(b"d\x01a".to_vec(), b"1".to_vec());
            store.commit(batch).unwrap();
        }

        let reopened = ParityStore::open(&path).unwrap();
        assert_eq!(reopened.get(b"d\x01a").unwrap(), Some(b"1".to_vec()));
    }
}
