//! Deterministic address derivation.
//!
//! Every function here is pure: the same inputs give the same address before and
//! after the deployment happens, on any machine, without reading ledger state.

use sha2::{Digest, Sha256};

use crate::code_hashes::{
    IMPLEMENTATION_HOLDER_CODE_HASH, MANY_TO_ONE_CODE_HASH, ONE_TO_ONE_CODE_HASH,
};
use crate::id::{Address, CodeHash, ImplementationId, Salt};

/// Domain separator for salted deployments
pub const DEPLOY_DOMAIN_TAG: &[u8] = b"PROXIES_Create2";

/// Domain separator for nonce-based deployments
pub const CREATE_DOMAIN_TAG: &[u8] = b"PROXIES_Create";

/// Address of a program deployed by `deployer` with `salt`, whose image hashes to `code_hash`
pub fn derive_address(deployer: &Address, salt: &Salt, code_hash: &CodeHash) -> Address {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(DEPLOY_DOMAIN_TAG);

    hasher.update(deployer.bytes());
    hasher.update(salt.bytes());
    hasher.update(code_hash.bytes());

    let digest: [u8; 32] = hasher.finalize().into();
    Address::from_digest(&digest)
}

/// Address of the `nonce`-th plain deployment made by `deployer`
pub fn derive_create_address(deployer: &Address, nonce: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(CREATE_DOMAIN_TAG);
    hasher.update(deployer.bytes());
    hasher.update(nonce.to_be_bytes());

    let digest: [u8; 32] = hasher.finalize().into();
    Address::from_digest(&digest)
}

/// Salt of a direct proxy, namespaced by the account that requested it
pub fn one_to_one_salt(origin: &Address, salt: &Salt) -> Salt {
    let mut hasher = Sha256::new();
    hasher.update(origin.bytes());
    hasher.update(salt.bytes());
    Salt::new(hasher.finalize().into())
}

/// Salt of an indirect proxy, namespaced by the requesting account and the relationship
pub fn many_to_one_salt(
    origin: &Address,
    implementation_id: &ImplementationId,
    proxy_id: &Salt,
) -> Salt {
    let mut hasher = Sha256::new();
    hasher.update(origin.bytes());
    hasher.update(implementation_id.bytes());
    hasher.update(proxy_id.bytes());
    Salt::new(hasher.finalize().into())
}

/// Where `manager` deploys a direct proxy requested by `origin` with `salt`
pub fn derive_direct_proxy_address(manager: &Address, origin: &Address, salt: &Salt) -> Address {
    derive_address(manager, &one_to_one_salt(origin, salt), &ONE_TO_ONE_CODE_HASH)
}

/// Where `manager` deploys the holder of `implementation_id`
pub fn derive_holder_address(manager: &Address, implementation_id: &ImplementationId) -> Address {
    derive_address(
        manager,
        &Salt::from(*implementation_id),
        &IMPLEMENTATION_HOLDER_CODE_HASH,
    )
}

/// Where `manager` deploys an indirect proxy requested by `origin`
pub fn derive_indirect_proxy_address(
    manager: &Address,
    origin: &Address,
    implementation_id: &ImplementationId,
    proxy_id: &Salt,
) -> Address {
    derive_address(
        manager,
        &many_to_one_salt(origin, implementation_id, proxy_id),
        &MANY_TO_ONE_CODE_HASH,
    )
}
