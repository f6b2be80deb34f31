use proxies_core::CodeHash;

use crate::context::CallContext;
use crate::error::Revert;

/// Executable code installed at a ledger account.
///
/// A program is stateless: everything it remembers lives in the storage of the
/// account it runs against, which the ledger journals and rolls back on failure.
/// Under a delegate call that account is the caller's, not the program's own.
pub trait Program: Send + Sync {
    /// Human readable name, used in logs
    fn name(&self) -> &str;

    /// Byte image identifying this program. Its hash is the account's code hash and
    /// feeds into salted address derivation.
    fn image(&self) -> &[u8];

    fn code_hash(&self) -> CodeHash {
        CodeHash::of(self.image())
    }

    /// Runs once, in the same step that installs the program at its address.
    /// A failure leaves no account behind.
    fn construct(&self, _ctx: &mut CallContext<'_>, _args: &[u8]) -> Result<(), Revert> {
        Ok(())
    }

    /// Handle a call with the given input, returning its output
    fn execute(&self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, Revert>;
}
