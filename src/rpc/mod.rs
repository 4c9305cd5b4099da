// Copyright (c) 2025 The Fact0rn Core Developers
// SPDX-License-Identifier: MIT

//! The deadpool RPC surface (spec §6).

pub mod server;
pub mod types;

pub use server::{serve, DeadpoolRpcImpl, DeadpoolRpcServer};
