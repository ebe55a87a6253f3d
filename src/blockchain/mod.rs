// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM chain integration.
//!
//! This module provides the alloy-backed collaborators for sign-in checks:
//! - Chain id and native balance queries ([`EvmClient`])
//! - Allow-list contract membership ([`AddressListContract`])

pub mod address_list;
pub mod client;

pub use address_list::AddressListContract;
pub use client::{parse_address, EvmClient, HttpProvider};
