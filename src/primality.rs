// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! A from-scratch Miller–Rabin probable-prime test over [`BigUint`].
//!
//! Spec §9 notes that consensus requires the *same* witness selection
//! across implementations or the accepted-factor set diverges, and that a
//! reimplementer should either find a bignum library with an
//! equivalent-or-stricter test or ship its own. We ship our own: witnesses
//! are derived deterministically from the candidate itself (a SHA-256
//! stream keyed on the candidate's canonical bytes), so the same `n`
//! always produces the same witness sequence on any machine, in any run —
//! there is no dependency on a system RNG for consensus-critical checks.

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

const SMALL_PRIMES: &[u64] = &[2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47];

/// `true` iff `n` passes trial division by small primes and `rounds`
/// Miller–Rabin rounds with deterministically derived witnesses.
pub fn is_probable_prime(n: &BigUint, rounds: u32) -> bool {
    if n < &BigUint::from(2u8) {
        return false;
    }
    for &p in SMALL_PRIMES {
        let p = BigUint::from(p);
        if n == &p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    let n_minus_one = n - BigUint::one();
    let trailing_zeros = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> trailing_zeros;

    let mut rng = seed_rng(n);
    'rounds: for _ in 0..rounds.max(1) {
        let a = rng.gen_biguint_range(&BigUint::from(2u8), &(n - BigUint::from(2u8)));
        let mut x = a.modpow(&d, n);
        if x == BigUint::one() || x == n_minus_one {
            continue;
        }
        for _ in 1..trailing_zeros {
            x = x.modpow(&BigUint::from(2u8), n);
            if x == n_minus_one {
                continue 'rounds;
            }
        }
        return false;
    }
    true
}

/// Smallest prime `>= from`, using the same deterministic primality test.
/// Used by `gHash` (spec §4.2), where the result only needs to be
/// reproducible, not cryptographically vetted by an external party.
pub fn next_prime(from: &BigUint) -> BigUint {
    let mut candidate = if from <= &BigUint::from(2u8) {
        return BigUint::from(2u8);
    } else if from.is_even() {
        from + BigUint::one()
    } else {
        from.clone()
    };
    loop {
        if is_probable_prime(&candidate, 20) {
            return candidate;
        }
        candidate += BigUint::from(2u8);
    }
}

fn seed_rng(n: &BigUint) -> ChaCha20Rng {
    let digest = Sha256::digest(n.to_bytes_le());
    let seed: [u8; 32] = digest.into();
    ChaCha20Rng::from_seed(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_primes_pass() {
        for p in [2u64, 3, 5, 7, 104729] {
            assert!(is_probable_prime(&BigUint::from(p), 40), "{p} should be prime");
        }
    }

    #[test]
    fn small_composites_fail() {
        for c in [4u64, 6, 8, 9, 15, 21, 341] {
            assert!(!is_probable_prime(&BigUint::from(c), 40), "{c} should be composite");
        }
    }

    #[test]
    fn deterministic_across_calls() {
        let n = BigUint::from(1_000_003u64);
        assert_eq!(is_probable_prime(&n, 30), is_probable_prime(&n, 30));
    }

    #[test]
    fn next_prime_is_prime_and_minimal() {
        let from = BigUint::from(100u64);
        let p = next_prime(&from);
        assert!(is_probable_prime(&p, 40));
        assert_eq!(p, BigUint::from(101u64));
    }
}
