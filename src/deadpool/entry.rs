// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! Typed construction of a deadpool entry output (spec §4.6).

use crate::bigint::BigInt;
use crate::deadpool::tx::{Amount, TxOut};
use crate::script::{build_deadpool_entry_script, deadpool_id};

pub struct DeadpoolEntry {
    pub n: BigInt,
    pub bounty: Amount,
}

impl DeadpoolEntry {
    pub fn new(n: BigInt, bounty: Amount) -> Self {
        Self { n, bounty }
    }

    pub fn deadpool_id(&self) -> [u8; 32] {
        deadpool_id(&self.n.to_signed_bytes())
    }

    pub fn to_txout(&self) -> TxOut {
        TxOut { value: self.bounty, script_pubkey: build_deadpool_entry_script(&self.n.to_signed_bytes()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::extract_entry_n;

    #[test]
    fn round_trips_through_the_script() {
        let entry = DeadpoolEntry::new(BigInt::from(143i64), 1_000_000);
        let txout = entry.to_txout();
        assert_eq!(txout.value, 1_000_000);
        let n_bytes = extract_entry_n(&txout.script_pubkey).unwrap();
        assert_eq!(BigInt::from_signed_bytes(n_bytes).unwrap(), entry.n);
        assert_eq!(crate::script::deadpool_id(n_bytes), entry.deadpool_id());
    }
}
