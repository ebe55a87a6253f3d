// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain collaborator contracts used by the built-in checks.
//!
//! Implementations live in [`crate::blockchain`]; tests use in-process fakes.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

/// Errors that can occur while querying the chain.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),
}

/// Read access to the connected network.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Native balance in the smallest unit (wei).
    async fn balance(&self, address: Address) -> Result<U256, ChainError>;
}

/// Read-only membership query against an allow-list contract.
#[async_trait]
pub trait ContractQuery: Send + Sync {
    /// Address of the queried contract, for diagnostics.
    fn contract_address(&self) -> Address;

    async fn is_address_in_list(&self, address: Address) -> Result<bool, ChainError>;
}
