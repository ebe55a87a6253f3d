// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational SiwE Gate - Sign-in with Ethereum verification service
//!
//! This crate verifies EIP-4361 signed messages and runs each sign-in
//! attempt through an ordered list of checks (session nonce, network,
//! on-chain allow-list, minimum balance) before a user is written into the
//! session.
//!
//! ## Modules
//!
//! - `signin` - Verification, checks, pipeline, and session contract
//! - `blockchain` - EVM JSON-RPC collaborators (alloy)
//! - `api` - HTTP API handlers (Axum)
//! - `config` - Environment configuration

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod models;
pub mod signin;
pub mod state;
