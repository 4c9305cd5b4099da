// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! Tracing setup, following the same `tracing_subscriber::fmt() +
//! EnvFilter` pattern forest's own binaries use.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber honoring `RUST_LOG`, defaulting
/// to `info`. Call once, at process startup.
pub fn init_tracing() {
    let filter = EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
