// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Allow-list contract interactions.

use alloy::{primitives::Address, providers::Provider, sol};
use async_trait::async_trait;

use super::client::parse_address;
use crate::signin::chain::{ChainError, ContractQuery};

// Membership view of the on-chain allow-list
sol! {
    #[sol(rpc)]
    interface IAddressList {
        function isAddressInList(address account) external view returns (bool);
    }
}

/// Allow-list contract wrapper.
pub struct AddressListContract<P> {
    contract: IAddressList::IAddressListInstance<P>,
    address: Address,
}

impl<P: Provider + Clone> AddressListContract<P> {
    pub fn new(provider: &P, contract_address: &str) -> Result<Self, ChainError> {
        let address = parse_address(contract_address)?;
        let contract = IAddressList::new(address, provider.clone());
        Ok(Self { contract, address })
    }
}

#[async_trait]
impl<P> ContractQuery for AddressListContract<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    fn contract_address(&self) -> Address {
        self.address
    }

    async fn is_address_in_list(&self, address: Address) -> Result<bool, ChainError> {
        self.contract
            .isAddressInList(address)
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))
    }
}
