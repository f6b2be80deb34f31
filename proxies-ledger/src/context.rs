use std::sync::Arc;

use proxies_core::{derive_address, Address, CodeHash, Salt};

use crate::error::{Fault, Revert};
use crate::program::Program;
use crate::receipt::Log;
use crate::state::LedgerState;
use crate::storage::Slot;

/// Identity of one executing call frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Account whose storage the frame reads and writes
    pub this: Address,

    /// Account the frame acts on behalf of
    pub caller: Address,

    /// Account whose program is running. Differs from `this` under a delegate call.
    pub code_address: Address,

    pub is_static: bool,
    pub depth: usize,
}

impl Frame {
    /// Frame for a transaction submitted by `from` to `to`
    pub fn top_level(from: Address, to: Address, is_static: bool) -> Self {
        Self {
            this: to,
            caller: from,
            code_address: to,
            is_static,
            depth: 0,
        }
    }
}

/// The host interface a running program sees
pub struct CallContext<'a> {
    state: &'a mut LedgerState,
    frame: Frame,
}

impl<'a> CallContext<'a> {
    pub(crate) fn new(state: &'a mut LedgerState, frame: Frame) -> Self {
        Self { state, frame }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn this(&self) -> Address {
        self.frame.this
    }

    pub fn caller(&self) -> Address {
        self.frame.caller
    }

    pub fn code_address(&self) -> Address {
        self.frame.code_address
    }

    pub fn depth(&self) -> usize {
        self.frame.depth
    }

    pub fn is_static(&self) -> bool {
        self.frame.is_static
    }

    pub fn load(&self, slot: &Slot) -> Option<Vec<u8>> {
        self.state.load(&self.frame.this, slot).map(<[u8]>::to_vec)
    }

    pub fn store(&mut self, slot: Slot, value: Vec<u8>) -> Result<(), Revert> {
        self.ensure_mutable()?;
        self.state.store(self.frame.this, slot, Some(value));
        Ok(())
    }

    pub fn clear(&mut self, slot: Slot) -> Result<(), Revert> {
        self.ensure_mutable()?;
        self.state.store(self.frame.this, slot, None);
        Ok(())
    }

    /// Call `to` as this account. A static frame only makes static calls.
    pub fn call(&mut self, to: Address, input: &[u8]) -> Result<Vec<u8>, Revert> {
        let frame = Frame {
            this: to,
            caller: self.frame.this,
            code_address: to,
            is_static: self.frame.is_static,
            depth: self.frame.depth + 1,
        };
        self.state.execute_frame(frame, input)
    }

    /// Call `to` with every state change forbidden
    pub fn static_call(&mut self, to: Address, input: &[u8]) -> Result<Vec<u8>, Revert> {
        let frame = Frame {
            this: to,
            caller: self.frame.this,
            code_address: to,
            is_static: true,
            depth: self.frame.depth + 1,
        };
        self.state.execute_frame(frame, input)
    }

    /// Run the program at `code` against this frame's storage, keeping this frame's caller
    pub fn delegate_call(&mut self, code: Address, input: &[u8]) -> Result<Vec<u8>, Revert> {
        let frame = Frame {
            this: self.frame.this,
            caller: self.frame.caller,
            code_address: code,
            is_static: self.frame.is_static,
            depth: self.frame.depth + 1,
        };
        self.state.execute_frame(frame, input)
    }

    /// Deploy `program` with `salt`, this account being the deployer.
    ///
    /// The new address is `derive_address(this, salt, program.code_hash())` and the
    /// constructor receives `args`. Deploying onto an account that already has code fails.
    pub fn deploy(
        &mut self,
        salt: &Salt,
        program: Arc<dyn Program>,
        args: &[u8],
    ) -> Result<Address, Revert> {
        self.ensure_mutable()?;
        let address = derive_address(&self.frame.this, salt, &program.code_hash());
        self.state.create(
            self.frame.this,
            address,
            program,
            args,
            self.frame.depth + 1,
        )?;
        Ok(address)
    }

    pub fn has_code(&self, address: &Address) -> bool {
        self.state.has_code(address)
    }

    pub fn code_hash_of(&self, address: &Address) -> Option<CodeHash> {
        self.state.code_hash_at(address)
    }

    pub fn emit(&mut self, data: Vec<u8>) -> Result<(), Revert> {
        self.ensure_mutable()?;
        self.state.push_log(Log {
            address: self.frame.this,
            data,
        });
        Ok(())
    }

    fn ensure_mutable(&self) -> Result<(), Revert> {
        if self.frame.is_static {
            return Err(Fault::StaticStateChange.into());
        }
        Ok(())
    }
}
