// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! Explicit context, replacing the process-wide singletons the source
//! chain uses (`g_deadpoolindex`, `globalChainParams`) per spec §9's
//! design note: "one context object constructed at node startup and
//! threaded through subsystems."

use crate::deadpool::{AnnounceDb, ChainNotify, DeadpoolConnector, DeadpoolIndex};
use crate::kvstore::KvStore;
use crate::params::ConsensusParams;
use std::sync::Arc;

/// Everything a node needs to validate blocks and serve the deadpool RPC
/// surface. Constructed once at startup; cloning is cheap (every field
/// is an `Arc` or plain data).
#[derive(Clone)]
pub struct Context {
    pub params: ConsensusParams,
    pub index: Arc<DeadpoolIndex>,
    pub announce_db: Arc<AnnounceDb>,
    pub connector: Arc<DeadpoolConnector>,
}

impl Context {
    /// Open the two on-disk tables spec §6 names
    /// (`indexes/deadpool/`, `announcedb/`) and wire a connector over
    /// them.
    pub fn new(params: ConsensusParams, index_store: Arc<dyn KvStore>, announce_store: Arc<dyn KvStore>) -> Self {
        let index = Arc::new(DeadpoolIndex::new(index_store));
        let announce_db = Arc::new(AnnounceDb::new(announce_store));
        let connector = Arc::new(DeadpoolConnector::new(index.clone(), announce_db.clone(), params.clone()));
        Self { params, index, announce_db, connector }
    }

    /// Convenience for tests and single-process setups: both tables
    /// backed by [`crate::kvstore::MemStore`].
    pub fn in_memory(params: ConsensusParams) -> Self {
        Self::new(params, Arc::new(crate::kvstore::MemStore::new()), Arc::new(crate::kvstore::MemStore::new()))
    }

    pub fn on_connect(&self, block: &crate::deadpool::index::IndexBlock) -> Result<(), crate::error::Error> {
        self.connector.on_connect(block)
    }

    pub fn on_disconnect(
        &self,
        block: &crate::deadpool::index::IndexBlock,
        prev_best: Option<(u64, [u8; 32])>,
    ) -> Result<(), crate::error::Error> {
        self.connector.on_disconnect(block, prev_best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_context_builds() {
        let ctx = Context::in_memory(ConsensusParams::mainnet());
        assert_eq!(ctx.index.best_block().unwrap(), None);
    }
}
