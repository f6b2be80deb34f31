//! Typed wrappers that encode registry calls, submit them to a ledger and decode
//! the results.

use std::sync::Arc;

use log::info;
use proxies_core::{derive_create_address, Address, ImplementationId, Salt};
use proxies_ledger::{Ledger, TransactionReceipt};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::abi::{GatewayCall, ManagerCall};
use crate::error::ClientError;
use crate::events::{decode_events, RegistryEvent};
use crate::gateway::AccessGateway;
use crate::manager::{DeploymentManager, Relationship};

/// A proxy deployment and the receipt of the transaction that made it
#[derive(Debug, Clone)]
pub struct Deployment {
    pub address: Address,
    pub receipt: TransactionReceipt,
}

fn submit(
    ledger: &mut Ledger,
    from: Address,
    to: Address,
    call: &impl Serialize,
) -> Result<TransactionReceipt, ClientError> {
    let input = bincode::serialize(call)?;
    ledger
        .transact(from, to, &input)
        .map_err(ClientError::from_registry_call)
}

fn deploy(
    ledger: &mut Ledger,
    from: Address,
    to: Address,
    call: &impl Serialize,
) -> Result<Deployment, ClientError> {
    let receipt = submit(ledger, from, to, call)?;
    let address = bincode::deserialize(&receipt.output)?;
    Ok(Deployment { address, receipt })
}

fn view<T: DeserializeOwned>(
    ledger: &mut Ledger,
    from: Address,
    to: Address,
    call: &impl Serialize,
) -> Result<T, ClientError> {
    let input = bincode::serialize(call)?;
    let output = ledger
        .view(from, to, &input)
        .map_err(ClientError::from_registry_call)?;
    Ok(bincode::deserialize(&output)?)
}

/// Client for a `DeploymentManager` account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerClient {
    address: Address,
}

impl ManagerClient {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn deploy_direct_proxy(
        &self,
        ledger: &mut Ledger,
        from: Address,
        salt: Salt,
        implementation: Address,
    ) -> Result<Deployment, ClientError> {
        deploy(ledger, from, self.address, &ManagerCall::DeployDirectProxy { salt, implementation })
    }

    pub fn set_direct_implementation(
        &self,
        ledger: &mut Ledger,
        from: Address,
        proxy: Address,
        implementation: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(
            ledger,
            from,
            self.address,
            &ManagerCall::SetDirectImplementation { proxy, implementation },
        )
    }

    pub fn lock_direct_proxy(
        &self,
        ledger: &mut Ledger,
        from: Address,
        proxy: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(ledger, from, self.address, &ManagerCall::LockDirectProxy { proxy })
    }

    pub fn create_indirect_relationship(
        &self,
        ledger: &mut Ledger,
        from: Address,
        implementation_id: ImplementationId,
        implementation: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(
            ledger,
            from,
            self.address,
            &ManagerCall::CreateIndirectRelationship { implementation_id, implementation },
        )
    }

    pub fn deploy_indirect_proxy(
        &self,
        ledger: &mut Ledger,
        from: Address,
        implementation_id: ImplementationId,
        proxy_id: Salt,
    ) -> Result<Deployment, ClientError> {
        deploy(
            ledger,
            from,
            self.address,
            &ManagerCall::DeployIndirectProxy { implementation_id, proxy_id },
        )
    }

    pub fn set_indirect_implementation(
        &self,
        ledger: &mut Ledger,
        from: Address,
        implementation_id: ImplementationId,
        implementation: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(
            ledger,
            from,
            self.address,
            &ManagerCall::SetIndirectImplementation { implementation_id, implementation },
        )
    }

    pub fn lock_indirect_relationship(
        &self,
        ledger: &mut Ledger,
        from: Address,
        implementation_id: ImplementationId,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(
            ledger,
            from,
            self.address,
            &ManagerCall::LockIndirectRelationship { implementation_id },
        )
    }

    pub fn approve_deployer(
        &self,
        ledger: &mut Ledger,
        from: Address,
        deployer: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(ledger, from, self.address, &ManagerCall::ApproveDeployer { deployer })
    }

    pub fn revoke_deployer_approval(
        &self,
        ledger: &mut Ledger,
        from: Address,
        deployer: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(ledger, from, self.address, &ManagerCall::RevokeDeployerApproval { deployer })
    }

    pub fn transfer_ownership(
        &self,
        ledger: &mut Ledger,
        from: Address,
        new_owner: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(ledger, from, self.address, &ManagerCall::TransferOwnership { new_owner })
    }

    pub fn owner(&self, ledger: &mut Ledger) -> Result<Address, ClientError> {
        view(ledger, Address::ZERO, self.address, &ManagerCall::Owner)
    }

    pub fn is_approved_deployer(
        &self,
        ledger: &mut Ledger,
        account: Address,
    ) -> Result<bool, ClientError> {
        view(ledger, Address::ZERO, self.address, &ManagerCall::IsApprovedDeployer { account })
    }

    pub fn compute_direct_proxy_address(
        &self,
        ledger: &mut Ledger,
        deployer: Address,
        salt: Salt,
    ) -> Result<Address, ClientError> {
        view(
            ledger,
            Address::ZERO,
            self.address,
            &ManagerCall::ComputeDirectProxyAddress { deployer, salt },
        )
    }

    pub fn compute_indirect_proxy_address(
        &self,
        ledger: &mut Ledger,
        deployer: Address,
        implementation_id: ImplementationId,
        proxy_id: Salt,
    ) -> Result<Address, ClientError> {
        view(
            ledger,
            Address::ZERO,
            self.address,
            &ManagerCall::ComputeIndirectProxyAddress { deployer, implementation_id, proxy_id },
        )
    }

    pub fn compute_holder_address(
        &self,
        ledger: &mut Ledger,
        implementation_id: ImplementationId,
    ) -> Result<Address, ClientError> {
        view(
            ledger,
            Address::ZERO,
            self.address,
            &ManagerCall::ComputeHolderAddress { implementation_id },
        )
    }

    pub fn relationship(
        &self,
        ledger: &mut Ledger,
        implementation_id: ImplementationId,
    ) -> Result<Option<Relationship>, ClientError> {
        view(ledger, Address::ZERO, self.address, &ManagerCall::Relationship { implementation_id })
    }

    pub fn implementation_holder(
        &self,
        ledger: &mut Ledger,
        implementation_id: ImplementationId,
    ) -> Result<Address, ClientError> {
        view(
            ledger,
            Address::ZERO,
            self.address,
            &ManagerCall::ImplementationHolder { implementation_id },
        )
    }

    pub fn is_relationship_locked(
        &self,
        ledger: &mut Ledger,
        implementation_id: ImplementationId,
    ) -> Result<bool, ClientError> {
        view(
            ledger,
            Address::ZERO,
            self.address,
            &ManagerCall::IsRelationshipLocked { implementation_id },
        )
    }

    pub fn direct_implementation(
        &self,
        ledger: &mut Ledger,
        proxy: Address,
    ) -> Result<Address, ClientError> {
        view(ledger, Address::ZERO, self.address, &ManagerCall::DirectImplementation { proxy })
    }

    pub fn is_direct_proxy_locked(
        &self,
        ledger: &mut Ledger,
        proxy: Address,
    ) -> Result<bool, ClientError> {
        view(ledger, Address::ZERO, self.address, &ManagerCall::IsDirectProxyLocked { proxy })
    }
}

/// Client for an `AccessGateway` account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayClient {
    address: Address,
}

impl GatewayClient {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn grant_admin_access(
        &self,
        ledger: &mut Ledger,
        from: Address,
        account: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(ledger, from, self.address, &GatewayCall::GrantAdminAccess { account })
    }

    pub fn revoke_admin_access(
        &self,
        ledger: &mut Ledger,
        from: Address,
        account: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(ledger, from, self.address, &GatewayCall::RevokeAdminAccess { account })
    }

    pub fn approve_deployer(
        &self,
        ledger: &mut Ledger,
        from: Address,
        deployer: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(ledger, from, self.address, &GatewayCall::ApproveDeployer { deployer })
    }

    pub fn revoke_deployer_approval(
        &self,
        ledger: &mut Ledger,
        from: Address,
        deployer: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(ledger, from, self.address, &GatewayCall::RevokeDeployerApproval { deployer })
    }

    pub fn create_indirect_relationship(
        &self,
        ledger: &mut Ledger,
        from: Address,
        implementation_id: ImplementationId,
        implementation: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(
            ledger,
            from,
            self.address,
            &GatewayCall::CreateIndirectRelationship { implementation_id, implementation },
        )
    }

    pub fn set_indirect_implementation(
        &self,
        ledger: &mut Ledger,
        from: Address,
        implementation_id: ImplementationId,
        implementation: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(
            ledger,
            from,
            self.address,
            &GatewayCall::SetIndirectImplementation { implementation_id, implementation },
        )
    }

    pub fn lock_indirect_relationship(
        &self,
        ledger: &mut Ledger,
        from: Address,
        implementation_id: ImplementationId,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(
            ledger,
            from,
            self.address,
            &GatewayCall::LockIndirectRelationship { implementation_id },
        )
    }

    pub fn deploy_direct_proxy(
        &self,
        ledger: &mut Ledger,
        from: Address,
        salt: Salt,
        implementation: Address,
    ) -> Result<Deployment, ClientError> {
        deploy(ledger, from, self.address, &GatewayCall::DeployDirectProxy { salt, implementation })
    }

    pub fn set_direct_implementation(
        &self,
        ledger: &mut Ledger,
        from: Address,
        proxy: Address,
        implementation: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(
            ledger,
            from,
            self.address,
            &GatewayCall::SetDirectImplementation { proxy, implementation },
        )
    }

    pub fn lock_direct_proxy(
        &self,
        ledger: &mut Ledger,
        from: Address,
        proxy: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(ledger, from, self.address, &GatewayCall::LockDirectProxy { proxy })
    }

    pub fn deploy_indirect_proxy(
        &self,
        ledger: &mut Ledger,
        from: Address,
        implementation_id: ImplementationId,
        proxy_id: Salt,
    ) -> Result<Deployment, ClientError> {
        deploy(
            ledger,
            from,
            self.address,
            &GatewayCall::DeployIndirectProxy { implementation_id, proxy_id },
        )
    }

    pub fn transfer_ownership(
        &self,
        ledger: &mut Ledger,
        from: Address,
        new_owner: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(ledger, from, self.address, &GatewayCall::TransferOwnership { new_owner })
    }

    pub fn transfer_manager_ownership(
        &self,
        ledger: &mut Ledger,
        from: Address,
        new_owner: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        submit(ledger, from, self.address, &GatewayCall::TransferManagerOwnership { new_owner })
    }

    pub fn owner(&self, ledger: &mut Ledger) -> Result<Address, ClientError> {
        view(ledger, Address::ZERO, self.address, &GatewayCall::Owner)
    }

    pub fn proxy_manager(&self, ledger: &mut Ledger) -> Result<Address, ClientError> {
        view(ledger, Address::ZERO, self.address, &GatewayCall::ProxyManager)
    }

    pub fn has_admin_access(
        &self,
        ledger: &mut Ledger,
        account: Address,
    ) -> Result<bool, ClientError> {
        view(ledger, Address::ZERO, self.address, &GatewayCall::HasAdminAccess { account })
    }

    pub fn is_approved_deployer(
        &self,
        ledger: &mut Ledger,
        account: Address,
    ) -> Result<bool, ClientError> {
        view(ledger, Address::ZERO, self.address, &GatewayCall::IsApprovedDeployer { account })
    }

    pub fn compute_direct_proxy_address(
        &self,
        ledger: &mut Ledger,
        deployer: Address,
        salt: Salt,
    ) -> Result<Address, ClientError> {
        view(
            ledger,
            Address::ZERO,
            self.address,
            &GatewayCall::ComputeDirectProxyAddress { deployer, salt },
        )
    }

    pub fn compute_indirect_proxy_address(
        &self,
        ledger: &mut Ledger,
        deployer: Address,
        implementation_id: ImplementationId,
        proxy_id: Salt,
    ) -> Result<Address, ClientError> {
        view(
            ledger,
            Address::ZERO,
            self.address,
            &GatewayCall::ComputeIndirectProxyAddress { deployer, implementation_id, proxy_id },
        )
    }

    pub fn compute_holder_address(
        &self,
        ledger: &mut Ledger,
        implementation_id: ImplementationId,
    ) -> Result<Address, ClientError> {
        view(
            ledger,
            Address::ZERO,
            self.address,
            &GatewayCall::ComputeHolderAddress { implementation_id },
        )
    }
}

/// Addresses a genesis run will produce, known before it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenesisAddresses {
    pub manager: Address,
    pub gateway: Address,
}

/// A wired manager and gateway pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registry {
    pub manager: ManagerClient,
    pub gateway: GatewayClient,
}

impl Registry {
    /// Deploy a manager and a gateway from `deployer` and hand the manager to the gateway.
    ///
    /// `deployer` ends up owning the gateway. The manager's owner is the gateway.
    pub fn genesis(ledger: &mut Ledger, deployer: Address) -> Result<Self, ClientError> {
        let predicted = Self::predict(deployer, ledger.nonce_of(&deployer));

        let manager = ledger
            .deploy(deployer, Arc::new(DeploymentManager), &[])?
            .contract_address
            .unwrap_or(predicted.manager);
        let gateway = ledger
            .deploy(deployer, Arc::new(AccessGateway), &bincode::serialize(&manager)?)?
            .contract_address
            .unwrap_or(predicted.gateway);

        let registry = Self {
            manager: ManagerClient::new(manager),
            gateway: GatewayClient::new(gateway),
        };
        registry.manager.transfer_ownership(ledger, deployer, gateway)?;

        info!("Registry genesis: manager {} gateway {} owner {}", manager, gateway, deployer);
        Ok(registry)
    }

    /// Where `genesis` deploys the manager and gateway when `deployer` is at `nonce`
    pub fn predict(deployer: Address, nonce: u64) -> GenesisAddresses {
        GenesisAddresses {
            manager: derive_create_address(&deployer, nonce),
            gateway: derive_create_address(&deployer, nonce + 1),
        }
    }

    pub fn manager_address(&self) -> Address {
        self.manager.address()
    }

    pub fn gateway_address(&self) -> Address {
        self.gateway.address()
    }

    /// Events this registry's manager and gateway emitted in `receipt`
    pub fn events(&self, receipt: &TransactionReceipt) -> Vec<(Address, RegistryEvent)> {
        decode_events(receipt, &[self.manager_address(), self.gateway_address()])
    }
}
