//! Forwarding programs.
//!
//! A proxy resolves its implementation on every call and delegate-calls it with the
//! untouched input, so the logic runs against the proxy's storage and sees the
//! original caller. Reverts from the logic come back byte for byte.
//!
//! Proxy bookkeeping lives at hashed slots that a logic unit's own layout will not
//! reach.

use proxies_core::{Address, CodeHash, MANY_TO_ONE_CODE_HASH, ONE_TO_ONE_CODE_HASH};
use proxies_ledger::{CallContext, Program, Revert, StorageValue};

use crate::abi::{decode, encode, ProxyAdminCall};
use crate::error::RegistryError;

pub const DIRECT_PROXY_IMAGE: &[u8] = b"proxies/direct-proxy/1";
pub const INDIRECT_PROXY_IMAGE: &[u8] = b"proxies/indirect-proxy/1";

fn forward(
    ctx: &mut CallContext<'_>,
    implementation: Address,
    input: &[u8],
) -> Result<Vec<u8>, Revert> {
    if implementation.is_zero() {
        return Err(RegistryError::ImplementationNotSet.into());
    }
    ctx.delegate_call(implementation, input)
}

/// Proxy holding its own implementation pointer and lock flag.
///
/// Calls from the deploying manager are admin messages and are never forwarded.
pub struct DirectProxy;

impl DirectProxy {
    fn implementation() -> StorageValue<Address> {
        StorageValue::new("proxies.direct.implementation")
    }

    fn manager() -> StorageValue<Address> {
        StorageValue::new("proxies.direct.manager")
    }

    fn locked() -> StorageValue<bool> {
        StorageValue::new("proxies.direct.locked")
    }

    fn administer(ctx: &mut CallContext<'_>, call: ProxyAdminCall) -> Result<Vec<u8>, Revert> {
        let locked = Self::locked().get(ctx)?.unwrap_or(false);
        match call {
            ProxyAdminCall::SetImplementation(implementation) => {
                if locked {
                    return Err(RegistryError::AlreadyLocked.into());
                }
                Self::implementation().set(ctx, &implementation)?;
                Ok(Vec::new())
            }
            ProxyAdminCall::Lock => {
                if locked {
                    return Err(RegistryError::AlreadyLocked.into());
                }
                Self::locked().set(ctx, &true)?;
                Ok(Vec::new())
            }
            ProxyAdminCall::Implementation => {
                let implementation = Self::implementation().get(ctx)?.unwrap_or(Address::ZERO);
                Ok(encode(&implementation)?)
            }
            ProxyAdminCall::IsLocked => Ok(encode(&locked)?),
        }
    }
}

impl Program for DirectProxy {
    fn name(&self) -> &str {
        "direct-proxy"
    }

    fn image(&self) -> &[u8] {
        DIRECT_PROXY_IMAGE
    }

    fn code_hash(&self) -> CodeHash {
        ONE_TO_ONE_CODE_HASH
    }

    fn construct(&self, ctx: &mut CallContext<'_>, args: &[u8]) -> Result<(), Revert> {
        let implementation: Address = decode(args)?;
        let manager = ctx.caller();
        Self::manager().set(ctx, &manager)?;
        Self::implementation().set(ctx, &implementation)?;
        Self::locked().set(ctx, &false)
    }

    fn execute(&self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, Revert> {
        let manager = Self::manager().get(ctx)?.unwrap_or(Address::ZERO);
        if ctx.caller() == manager {
            return Self::administer(ctx, decode(input)?);
        }

        let implementation = Self::implementation().get(ctx)?.unwrap_or(Address::ZERO);
        forward(ctx, implementation, input)
    }
}

/// Proxy that asks a shared holder for its implementation
pub struct IndirectProxy;

impl IndirectProxy {
    fn holder() -> StorageValue<Address> {
        StorageValue::new("proxies.indirect.holder")
    }
}

impl Program for IndirectProxy {
    fn name(&self) -> &str {
        "indirect-proxy"
    }

    fn image(&self) -> &[u8] {
        INDIRECT_PROXY_IMAGE
    }

    fn code_hash(&self) -> CodeHash {
        MANY_TO_ONE_CODE_HASH
    }

    fn construct(&self, ctx: &mut CallContext<'_>, args: &[u8]) -> Result<(), Revert> {
        let holder: Address = decode(args)?;
        Self::holder().set(ctx, &holder)
    }

    fn execute(&self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, Revert> {
        let holder = Self::holder().get(ctx)?.unwrap_or(Address::ZERO);
        let implementation: Address = decode(&ctx.static_call(holder, &[])?)?;
        forward(ctx, implementation, input)
    }
}
