use proxies_core::{Address, CodeHash, IMPLEMENTATION_HOLDER_CODE_HASH};
use proxies_ledger::{CallContext, Program, Revert, StorageValue};

use crate::abi::{decode, encode, HolderCall};

pub const IMPLEMENTATION_HOLDER_IMAGE: &[u8] = b"proxies/implementation-holder/1";

/// Shared upgrade point of a many-to-one relationship.
///
/// Its deploying manager may replace the stored address; any other caller gets the
/// stored address back, whatever the input.
pub struct ImplementationHolder;

impl ImplementationHolder {
    fn implementation() -> StorageValue<Address> {
        StorageValue::new("proxies.holder.implementation")
    }

    fn manager() -> StorageValue<Address> {
        StorageValue::new("proxies.holder.manager")
    }
}

impl Program for ImplementationHolder {
    fn name(&self) -> &str {
        "implementation-holder"
    }

    fn image(&self) -> &[u8] {
        IMPLEMENTATION_HOLDER_IMAGE
    }

    fn code_hash(&self) -> CodeHash {
        IMPLEMENTATION_HOLDER_CODE_HASH
    }

    fn construct(&self, ctx: &mut CallContext<'_>, args: &[u8]) -> Result<(), Revert> {
        let implementation: Address = decode(args)?;
        let manager = ctx.caller();
        Self::manager().set(ctx, &manager)?;
        Self::implementation().set(ctx, &implementation)
    }

    fn execute(&self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, Revert> {
        let manager = Self::manager().get(ctx)?.unwrap_or(Address::ZERO);
        if ctx.caller() == manager && !input.is_empty() {
            let HolderCall::SetImplementation(implementation) = decode(input)?;
            Self::implementation().set(ctx, &implementation)?;
            return Ok(Vec::new());
        }

        let implementation = Self::implementation().get(ctx)?.unwrap_or(Address::ZERO);
        Ok(encode(&implementation)?)
    }
}
