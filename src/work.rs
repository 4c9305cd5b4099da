// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! `GetBlockProof` (spec §4.5): an integer approximation of ECM factoring
//! cost, shaped so it stays additive across blocks of heterogeneous
//! factor sizes instead of collapsing to multiplication the way directly
//! exponentiating the cost formula would.

use crate::header::BlockHeader;
use derive_more::{Display, From};
use num_bigint::BigUint;
use num_traits::Zero;
use std::iter::Sum;
use std::ops::Add;

/// A 256-bit work accumulator (spec §4.5), newtype-wrapped over
/// [`BigUint`] the same way [`crate::bigint::BigInt`] wraps its signed
/// counterpart, so `nChainWork` can't be mixed up with a plain integer
/// at a call site.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, From, Display)]
pub struct Work(BigUint);

impl Work {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn to_base(&self) -> &BigUint {
        &self.0
    }
}

impl Add for Work {
    type Output = Work;
    fn add(self, rhs: Work) -> Work {
        Work(self.0 + rhs.0)
    }
}

impl Sum for Work {
    fn sum<I: Iterator<Item = Work>>(iter: I) -> Self {
        iter.fold(Work::zero(), Add::add)
    }
}

/// `(1 << aInt) + (floor(1024 * aFrac) << (aInt - 11))`, where
/// `a = sqrt(2 * b * log2(b))` and `b = bitlength(nP1)`.
///
/// Returns `0` for `b < 16` — factoring anything that small carries no
/// meaningful work, by definition (spec §4.5).
pub fn get_block_proof(header: &BlockHeader) -> Work {
    let b = header.np1_bigint().bits();
    work_for_factor_bits(b)
}

pub fn work_for_factor_bits(b: u64) -> Work {
    if b < 16 {
        return Work::zero();
    }
    let b_f = b as f64;
    let a = (2.0 * b_f * b_f.log2()).sqrt();
    let a_int = a.floor() as u64;
    let a_frac = a - a.floor();

    let base = BigUint::from(1u8) << a_int;
    let frac_term = BigUint::from((1024.0 * a_frac).floor() as u64) << (a_int.saturating_sub(11));
    Work(base + frac_term)
}

/// Sum work across a run of headers — `nChainWork`.
pub fn chain_work<'a>(headers: impl IntoIterator<Item = &'a BlockHeader>) -> Work {
    headers.into_iter().map(get_block_proof).sum()
}
