//! Upgradeable proxy deployment registry
//!
//! This crate re-exports all the components of the registry: identifiers and address
//! derivation, the ledger host, and the registry programs with their clients.

pub use proxies_contracts::*;
pub use proxies_core::*;
pub use proxies_ledger::*;
