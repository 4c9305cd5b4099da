// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Reasons a block or transaction is rejected by consensus.
///
/// Variant names double as the wire reason string surfaced to peers and to
/// RPC callers (see scenario E of the deadpool claim-timing tests): match on
/// `to_string()` rather than the variant itself when comparing against a
/// reason string from another implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("bad-bits")]
    BadBits,
    #[error("bad-offset")]
    BadOffset,
    #[error("bad-factorization")]
    BadFactorization,
    #[error("non-prime-factor")]
    NonPrimeFactor,
    #[error("mis-sized-factor")]
    MisSizedFactor,
    #[error("bad-bigint-zero")]
    BadBigIntZero,
    #[error("bad-bigint-negative")]
    BadBigIntNegative,
    #[error("bad-bigint-too-small")]
    BadBigIntTooSmall,
    #[error("bad-bigint-too-large")]
    BadBigIntTooLarge,
    #[error("bad-bigint-non-canonical-size")]
    BadBigIntNonCanonicalSize,
    #[error("bad-bigint-non-canonical")]
    BadBigIntNonCanonical,
    #[error("claim-without-announcement")]
    ClaimWithoutAnnouncement,
    #[error("claim-before-maturity")]
    ClaimBeforeMaturity,
    #[error("claim-after-validity")]
    ClaimAfterValidity,
}

/// The same rule set as [`ConsensusError`], raised as mempool policy rather
/// than a hard consensus rejection while a softfork deployment has not yet
/// activated (spec.md §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("policy-invalid: {0}")]
pub struct PolicyError(#[from] pub ConsensusError);

/// Internal, fatal disagreement between an index's saved best block and the
/// chain tip. Not a consensus error: the fix is a re-sync, not a rejection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("index-inconsistent: index at height {index_height}, tip at height {tip_height}")]
pub struct IndexInconsistent {
    pub index_height: u64,
    pub tip_height: u64,
}

/// User-facing errors from the RPC surface. Always carries a decodable
/// reason string, never a raw internal error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("invalid-decimal: {0}")]
    InvalidDecimal(String),
    #[error("invalid-address: {0}")]
    InvalidAddress(String),
    #[error("wrong-solution")]
    WrongSolution,
    #[error("insufficient-burn: got {got}, need at least {min}")]
    InsufficientBurn { got: u64, min: u64 },
    #[error("unknown-deadpool-id")]
    UnknownDeadpoolId,
}

/// Crate-wide error, used where a caller needs to propagate across
/// subsystem boundaries (e.g. the block connector, which touches both the
/// index and the announcement database).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Consensus(#[from] ConsensusError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Index(#[from] IndexInconsistent),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Store(#[from] crate::kvstore::StoreError),
    #[error("{0}")]
    Other(String),
}
