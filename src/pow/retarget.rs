// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! Difficulty retargeting (spec §4.4). Difficulty here is a small integer
//! — `nBits` drifts by at most 1 per retarget window — rather than a
//! compact 256-bit target, so the whole adjustment collapses to three
//! comparisons against the timespan ratio.

use crate::params::ConsensusParams;

/// `nBits` for the block that opens the next retarget window, given the
/// current `nBits` and the observed span (in seconds) of the window that
/// just closed.
///
/// `min_difficulty_window` is only meaningful on networks with
/// `allow_min_difficulty_blocks` set (testnet): `true` when the block
/// being produced arrives more than `2 * pow_target_spacing` after its
/// predecessor, in which case the network permits mining at `pow_limit`
/// regardless of the ratio computed below.
pub fn next_work_required(
    current_bits: u16,
    actual_timespan: u32,
    params: &ConsensusParams,
    min_difficulty_window: bool,
) -> u16 {
    if params.allow_min_difficulty_blocks && min_difficulty_window {
        return params.pow_limit;
    }

    let target = f64::from(params.pow_target_timespan);
    let ratio = f64::from(actual_timespan) / target;

    let adjusted = if ratio > 1.0333 {
        current_bits.saturating_sub(1)
    } else if ratio < 0.90 {
        current_bits.saturating_add(1)
    } else {
        current_bits
    };

    adjusted.clamp(params.pow_limit, params.pow_max_bits - 1)
}
