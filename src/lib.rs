// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! Factorization proof-of-work consensus and the deadpool bounty
//! protocol: the two halves of a FACT0RN-family chain's core that are
//! novel relative to a standard Bitcoin-family node.
//!
//! This crate implements:
//! - [`bigint`] — canonical signed-integer encoding.
//! - [`pow`] and [`work`] — the `gHash`/`CheckProofOfWork`/retarget/
//!   `GetBlockProof` proof-of-work pipeline.
//! - [`header`] — the consensus-encoded block header.
//! - [`script`] and [`deadpool`] — the deadpool script opcodes, the
//!   RPC-facing index, and the consensus-critical announcement database.
//! - [`rpc`] — the deadpool RPC surface.
//!
//! It does not implement the surrounding node (P2P, mempool, wallet,
//! base58, build glue) — see [`context::Context`] and the
//! [`deadpool::tx::CoinView`] / [`deadpool::connect::ChainNotify`] /
//! [`kvstore::KvStore`] traits for the boundary such a node implements.

pub mod bigint;
pub mod context;
pub mod deadpool;
pub mod error;
pub mod header;
pub mod kvstore;
pub mod logging;
pub mod params;
pub mod pow;
pub mod primality;
pub mod rpc;
pub mod script;
pub mod softfork;
pub mod work;
