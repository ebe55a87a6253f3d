// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM JSON-RPC client used by the chain-backed sign-in checks.

use std::str::FromStr;

use alloy::{
    network::Ethereum,
    primitives::{Address, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
};
use async_trait::async_trait;

use super::address_list::AddressListContract;
use crate::signin::chain::{ChainError, ChainProvider};

/// HTTP provider type (with the default fillers).
pub type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Read-only client for one EVM network.
#[derive(Clone)]
pub struct EvmClient {
    provider: HttpProvider,
}

impl EvmClient {
    /// Create a client for the JSON-RPC endpoint at `rpc_url`.
    ///
    /// No request is made until the first query.
    pub fn new(rpc_url: &str) -> Result<Self, ChainError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self { provider })
    }

    /// Binding for the allow-list contract at `contract_address`.
    pub fn address_list(
        &self,
        contract_address: &str,
    ) -> Result<AddressListContract<HttpProvider>, ChainError> {
        AddressListContract::new(&self.provider, contract_address)
    }
}

#[async_trait]
impl ChainProvider for EvmClient {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))
    }

    async fn balance(&self, address: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))
    }
}

/// Parse a `0x`-prefixed hex address.
pub fn parse_address(raw: &str) -> Result<Address, ChainError> {
    Address::from_str(raw.trim()).map_err(|e| ChainError::InvalidAddress(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_rpc_url() {
        let err = EvmClient::new("not a url").err().unwrap();
        assert!(matches!(err, ChainError::InvalidRpcUrl(_)));
    }

    #[test]
    fn builds_client_without_connecting() {
        let client = EvmClient::new("http://localhost:8545").unwrap();
        assert!(client.address_list(&Address::ZERO.to_string()).is_ok());
    }

    #[test]
    fn parses_addresses() {
        let address = parse_address(" 0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed ").unwrap();
        assert_eq!(
            address.to_checksum(None),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
        assert!(matches!(
            parse_address("0x1234"),
            Err(ChainError::InvalidAddress(_))
        ));
    }
}
