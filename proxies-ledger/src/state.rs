use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::trace;
use proxies_core::{Address, CodeHash};

use crate::context::{CallContext, Frame};
use crate::error::{Fault, Revert};
use crate::program::Program;
use crate::receipt::{Log, StorageEffect};
use crate::storage::Slot;

/// A ledger account. External actors only ever carry a nonce.
#[derive(Clone, Default)]
pub struct Account {
    pub(crate) program: Option<Arc<dyn Program>>,
    pub(crate) code_hash: Option<CodeHash>,
    pub(crate) storage: BTreeMap<Slot, Vec<u8>>,
    pub(crate) nonce: u64,
}

impl Account {
    pub fn has_code(&self) -> bool {
        self.program.is_some()
    }

    pub fn code_hash(&self) -> Option<CodeHash> {
        self.code_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn storage(&self) -> &BTreeMap<Slot, Vec<u8>> {
        &self.storage
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("program", &self.program.as_ref().map(|p| p.name().to_string()))
            .field("code_hash", &self.code_hash)
            .field("storage_slots", &self.storage.len())
            .field("nonce", &self.nonce)
            .finish()
    }
}

/// How to take back one state change
#[derive(Debug, Clone)]
enum UndoEntry {
    Storage {
        address: Address,
        slot: Slot,
        previous: Option<Vec<u8>>,
    },
    Installed {
        address: Address,
    },
    Nonce {
        address: Address,
        previous: u64,
    },
}

/// Position in the undo log that a failing frame rolls back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Checkpoint {
    undo_len: usize,
    logs_len: usize,
}

/// Everything a transaction changed, collected when it commits
#[derive(Debug, Default)]
pub(crate) struct Changes {
    pub logs: Vec<Log>,
    pub effects: Vec<StorageEffect>,
    pub created: Vec<Address>,
}

/// Account state plus the undo log of the transaction in flight
pub struct LedgerState {
    accounts: HashMap<Address, Account>,
    undo: Vec<UndoEntry>,
    logs: Vec<Log>,
    max_call_depth: usize,
}

impl LedgerState {
    pub fn new(max_call_depth: usize) -> Self {
        Self {
            accounts: HashMap::new(),
            undo: Vec::new(),
            logs: Vec::new(),
            max_call_depth,
        }
    }

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn program_at(&self, address: &Address) -> Option<Arc<dyn Program>> {
        self.accounts
            .get(address)
            .and_then(|account| account.program.clone())
    }

    pub fn has_code(&self, address: &Address) -> bool {
        self.accounts
            .get(address)
            .map(Account::has_code)
            .unwrap_or(false)
    }

    pub fn code_hash_at(&self, address: &Address) -> Option<CodeHash> {
        self.accounts.get(address).and_then(|account| account.code_hash)
    }

    pub fn load(&self, address: &Address, slot: &Slot) -> Option<&[u8]> {
        self.accounts
            .get(address)
            .and_then(|account| account.storage.get(slot))
            .map(Vec::as_slice)
    }

    pub fn nonce_of(&self, address: &Address) -> u64 {
        self.accounts.get(address).map(|a| a.nonce).unwrap_or(0)
    }

    pub(crate) fn store(&mut self, address: Address, slot: Slot, value: Option<Vec<u8>>) {
        let account = self.accounts.entry(address).or_default();
        let previous = match value {
            Some(value) => account.storage.insert(slot, value),
            None => account.storage.remove(&slot),
        };
        self.undo.push(UndoEntry::Storage {
            address,
            slot,
            previous,
        });
    }

    pub(crate) fn bump_nonce(&mut self, address: Address) -> u64 {
        let account = self.accounts.entry(address).or_default();
        let previous = account.nonce;
        account.nonce += 1;
        self.undo.push(UndoEntry::Nonce { address, previous });
        previous
    }

    pub(crate) fn push_log(&mut self, log: Log) {
        self.logs.push(log);
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            undo_len: self.undo.len(),
            logs_len: self.logs.len(),
        }
    }

    /// Undo every change made since `checkpoint`, newest first
    pub(crate) fn revert_to(&mut self, checkpoint: Checkpoint) {
        while self.undo.len() > checkpoint.undo_len {
            let Some(entry) = self.undo.pop() else { break };
            match entry {
                UndoEntry::Storage {
                    address,
                    slot,
                    previous,
                } => {
                    if let Some(account) = self.accounts.get_mut(&address) {
                        match previous {
                            Some(value) => {
                                account.storage.insert(slot, value);
                            }
                            None => {
                                account.storage.remove(&slot);
                            }
                        }
                    }
                }
                UndoEntry::Installed { address } => {
                    if let Some(account) = self.accounts.get_mut(&address) {
                        account.program = None;
                        account.code_hash = None;
                    }
                }
                UndoEntry::Nonce { address, previous } => {
                    if let Some(account) = self.accounts.get_mut(&address) {
                        account.nonce = previous;
                    }
                }
            }
        }
        self.logs.truncate(checkpoint.logs_len);
    }

    /// Drop everything the transaction in flight did
    pub(crate) fn abort(&mut self) {
        self.revert_to(Checkpoint {
            undo_len: 0,
            logs_len: 0,
        });
    }

    /// Net changes of the transaction in flight, without settling them
    pub(crate) fn pending_changes(&self) -> Changes {
        let mut seen = HashSet::new();
        let mut effects = Vec::new();
        let mut created = Vec::new();

        // The first undo entry for a slot holds its value from before the transaction
        for entry in &self.undo {
            match entry {
                UndoEntry::Storage {
                    address,
                    slot,
                    previous,
                } => {
                    if !seen.insert((*address, *slot)) {
                        continue;
                    }
                    let after_image = self.load(address, slot).map(<[u8]>::to_vec);
                    if *previous != after_image {
                        effects.push(StorageEffect {
                            address: *address,
                            slot: *slot,
                            before_image: previous.clone(),
                            after_image,
                        });
                    }
                }
                UndoEntry::Installed { address } => created.push(*address),
                UndoEntry::Nonce { .. } => {}
            }
        }

        Changes {
            logs: self.logs.clone(),
            effects,
            created,
        }
    }

    /// Keep everything the transaction in flight did
    pub(crate) fn settle(&mut self) {
        self.undo.clear();
        self.logs.clear();
    }

    /// Run one call frame. A failing frame leaves no changes behind.
    pub(crate) fn execute_frame(&mut self, frame: Frame, input: &[u8]) -> Result<Vec<u8>, Revert> {
        if frame.depth > self.max_call_depth {
            return Err(Fault::CallDepthExceeded(self.max_call_depth).into());
        }
        let program = self
            .program_at(&frame.code_address)
            .ok_or(Fault::NoCode(frame.code_address))?;

        trace!(
            "frame depth {} running {} at {} for {}",
            frame.depth,
            program.name(),
            frame.this,
            frame.caller
        );

        let checkpoint = self.checkpoint();
        let result = {
            let mut ctx = CallContext::new(self, frame);
            program.execute(&mut ctx, input)
        };
        if result.is_err() {
            self.revert_to(checkpoint);
        }
        result
    }

    /// Install `program` at `address` and run its constructor, as one step
    pub(crate) fn create(
        &mut self,
        deployer: Address,
        address: Address,
        program: Arc<dyn Program>,
        args: &[u8],
        depth: usize,
    ) -> Result<(), Revert> {
        if depth > self.max_call_depth {
            return Err(Fault::CallDepthExceeded(self.max_call_depth).into());
        }
        if self.has_code(&address) {
            return Err(Fault::AddressOccupied(address).into());
        }

        let checkpoint = self.checkpoint();
        let account = self.accounts.entry(address).or_default();
        account.code_hash = Some(program.code_hash());
        account.program = Some(program.clone());
        self.undo.push(UndoEntry::Installed { address });

        let frame = Frame {
            this: address,
            caller: deployer,
            code_address: address,
            is_static: false,
            depth,
        };
        let result = {
            let mut ctx = CallContext::new(self, frame);
            program.construct(&mut ctx, args)
        };
        if let Err(revert) = result {
            self.revert_to(checkpoint);
            return Err(revert);
        }

        trace!("installed {} at {}", program.name(), address);
        Ok(())
    }
}

impl fmt::Debug for LedgerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerState")
            .field("accounts", &self.accounts.len())
            .field("pending_changes", &self.undo.len())
            .field("max_call_depth", &self.max_call_depth)
            .finish()
    }
}
