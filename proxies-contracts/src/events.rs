use proxies_core::{Address, ImplementationId, Salt};
use proxies_ledger::{CallContext, Revert, TransactionReceipt};
use serde::{Deserialize, Serialize};

use crate::abi::encode;

/// Marks log data produced by registry programs
pub const EVENT_PREFIX: &[u8] = b"PROXIES_Evt";

/// Record emitted once per registry operation, for external indexing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    DirectProxyDeployed {
        proxy: Address,
        origin: Address,
        salt: Salt,
        implementation: Address,
    },
    IndirectProxyDeployed {
        proxy: Address,
        origin: Address,
        implementation_id: ImplementationId,
        proxy_id: Salt,
        holder: Address,
    },
    RelationshipCreated {
        implementation_id: ImplementationId,
        implementation: Address,
        holder: Address,
    },
    DirectImplementationSet {
        proxy: Address,
        implementation: Address,
    },
    IndirectImplementationSet {
        implementation_id: ImplementationId,
        implementation: Address,
    },
    DirectProxyLocked {
        proxy: Address,
    },
    RelationshipLocked {
        implementation_id: ImplementationId,
    },
    DeployerApprovalChanged {
        deployer: Address,
        approved: bool,
    },
    AdminAccessChanged {
        account: Address,
        granted: bool,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
}

impl RegistryEvent {
    pub fn publish(&self, ctx: &mut CallContext<'_>) -> Result<(), Revert> {
        let mut data = EVENT_PREFIX.to_vec();
        data.extend_from_slice(&encode(self)?);
        ctx.emit(data)
    }

    pub fn from_log_data(data: &[u8]) -> Option<Self> {
        let encoded = data.strip_prefix(EVENT_PREFIX)?;
        bincode::deserialize(encoded).ok()
    }
}

/// Registry events in a receipt emitted by one of `emitters`, paired with the
/// emitting account, in emission order.
///
/// Any program can write log data that looks like a registry event, so only logs
/// from known registry accounts are decoded.
pub fn decode_events(
    receipt: &TransactionReceipt,
    emitters: &[Address],
) -> Vec<(Address, RegistryEvent)> {
    receipt
        .logs
        .iter()
        .filter(|log| emitters.contains(&log.address))
        .filter_map(|log| {
            RegistryEvent::from_log_data(&log.data).map(|event| (log.address, event))
        })
        .collect()
}
