pub mod abi;
pub mod client;
pub mod error;
pub mod events;
pub mod gateway;
pub mod holder;
pub mod manager;
pub mod proxy;

#[cfg(test)]
mod testing;

// Re-export the main types for convenience
pub use abi::{GatewayCall, HolderCall, ManagerCall, ProxyAdminCall};
pub use client::{Deployment, GatewayClient, GenesisAddresses, ManagerClient, Registry};
pub use error::{ClientError, ErrorKind, RegistryError, REASON_PREFIX};
pub use events::{decode_events, RegistryEvent, EVENT_PREFIX};
pub use gateway::{AccessGateway, ACCESS_GATEWAY_IMAGE};
pub use holder::{ImplementationHolder, IMPLEMENTATION_HOLDER_IMAGE};
pub use manager::{DeploymentManager, Relationship, DEPLOYMENT_MANAGER_IMAGE};
pub use proxy::{DirectProxy, IndirectProxy, DIRECT_PROXY_IMAGE, INDIRECT_PROXY_IMAGE};
