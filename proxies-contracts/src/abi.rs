//! Call data understood by the registry programs.
//!
//! Every message is a bincode-encoded enum. Outputs are the bincode encoding of the
//! operation's return value (empty for `()`).

use proxies_core::{Address, ImplementationId, Salt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagerCall {
    DeployDirectProxy {
        salt: Salt,
        implementation: Address,
    },
    SetDirectImplementation {
        proxy: Address,
        implementation: Address,
    },
    LockDirectProxy {
        proxy: Address,
    },
    CreateIndirectRelationship {
        implementation_id: ImplementationId,
        implementation: Address,
    },
    DeployIndirectProxy {
        implementation_id: ImplementationId,
        proxy_id: Salt,
    },
    SetIndirectImplementation {
        implementation_id: ImplementationId,
        implementation: Address,
    },
    LockIndirectRelationship {
        implementation_id: ImplementationId,
    },
    ApproveDeployer {
        deployer: Address,
    },
    RevokeDeployerApproval {
        deployer: Address,
    },
    TransferOwnership {
        new_owner: Address,
    },

    Owner,
    IsApprovedDeployer {
        account: Address,
    },
    ComputeDirectProxyAddress {
        deployer: Address,
        salt: Salt,
    },
    ComputeIndirectProxyAddress {
        deployer: Address,
        implementation_id: ImplementationId,
        proxy_id: Salt,
    },
    ComputeHolderAddress {
        implementation_id: ImplementationId,
    },
    Relationship {
        implementation_id: ImplementationId,
    },
    ImplementationHolder {
        implementation_id: ImplementationId,
    },
    IsRelationshipLocked {
        implementation_id: ImplementationId,
    },
    DirectImplementation {
        proxy: Address,
    },
    IsDirectProxyLocked {
        proxy: Address,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayCall {
    GrantAdminAccess {
        account: Address,
    },
    RevokeAdminAccess {
        account: Address,
    },
    ApproveDeployer {
        deployer: Address,
    },
    RevokeDeployerApproval {
        deployer: Address,
    },
    CreateIndirectRelationship {
        implementation_id: ImplementationId,
        implementation: Address,
    },
    SetIndirectImplementation {
        implementation_id: ImplementationId,
        implementation: Address,
    },
    LockIndirectRelationship {
        implementation_id: ImplementationId,
    },
    DeployDirectProxy {
        salt: Salt,
        implementation: Address,
    },
    SetDirectImplementation {
        proxy: Address,
        implementation: Address,
    },
    LockDirectProxy {
        proxy: Address,
    },
    DeployIndirectProxy {
        implementation_id: ImplementationId,
        proxy_id: Salt,
    },
    TransferOwnership {
        new_owner: Address,
    },
    TransferManagerOwnership {
        new_owner: Address,
    },

    Owner,
    ProxyManager,
    HasAdminAccess {
        account: Address,
    },
    IsApprovedDeployer {
        account: Address,
    },
    ComputeDirectProxyAddress {
        deployer: Address,
        salt: Salt,
    },
    ComputeIndirectProxyAddress {
        deployer: Address,
        implementation_id: ImplementationId,
        proxy_id: Salt,
    },
    ComputeHolderAddress {
        implementation_id: ImplementationId,
    },
}

/// Messages a direct proxy accepts from its deploying manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyAdminCall {
    SetImplementation(Address),
    Lock,
    Implementation,
    IsLocked,
}

/// Messages a holder accepts from its deploying manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HolderCall {
    SetImplementation(Address),
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, RegistryError> {
    bincode::serialize(value).map_err(|_| RegistryError::MalformedCall)
}

pub(crate) fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, RegistryError> {
    bincode::deserialize(data).map_err(|_| RegistryError::MalformedCall)
}
