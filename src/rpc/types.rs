// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! Request/response payloads for the deadpool RPC category (spec §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadpoolEntryView {
    pub n: String,
    pub bits: u64,
    pub deadpoolid: String,
    pub bounty: u64,
    pub entries: Vec<String>,
    pub announcements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDeadpoolEntriesParams {
    #[serde(default = "default_num_blocks")]
    pub num_blocks: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub include_claimed: bool,
    #[serde(default = "default_true")]
    pub include_announced: bool,
}

fn default_num_blocks() -> u64 {
    1_000
}
fn default_limit() -> u64 {
    1_000
}
fn default_true() -> bool {
    true
}

impl Default for ListDeadpoolEntriesParams {
    fn default() -> Self {
        Self { num_blocks: default_num_blocks(), limit: default_limit(), include_claimed: false, include_announced: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedDeadpoolEntry {
    pub deadpoolid: String,
    pub height: u64,
    pub bounty: u64,
    pub claimed: bool,
}
