use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use proxies_core::{derive_create_address, Address, CodeHash};

use crate::config::LedgerConfig;
use crate::context::Frame;
use crate::error::{LedgerError, Revert};
use crate::journal::{FileReceiptJournal, ReceiptJournal};
use crate::program::Program;
use crate::receipt::{TransactionHash, TransactionReceipt};
use crate::state::LedgerState;
use crate::storage::Slot;

/// Domain separator for transaction hashes
const TRANSACTION_DOMAIN_TAG: &[u8] = b"PROXIES_Tx";

/// A deterministic, transaction-ordered ledger.
///
/// Transactions run one at a time against `&mut self` and either commit fully,
/// producing a receipt, or leave no trace at all.
pub struct Ledger {
    config: LedgerConfig,
    state: LedgerState,
    sequence: u64,
    timestamp: DateTime<Utc>,
    receipts: Vec<TransactionReceipt>,
    receipt_index: HashMap<TransactionHash, usize>,
    journal: Option<Arc<dyn ReceiptJournal>>,
}

impl Ledger {
    /// Create a ledger, opening the configured receipt journal if there is one
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        let journal: Option<Arc<dyn ReceiptJournal>> = match &config.journal_path {
            Some(path) => Some(Arc::new(FileReceiptJournal::open(path)?)),
            None => None,
        };
        Ok(Self::with_parts(config, journal))
    }

    /// A ledger with default settings and no journal
    pub fn in_memory() -> Self {
        Self::with_parts(LedgerConfig::default(), None)
    }

    fn with_parts(config: LedgerConfig, journal: Option<Arc<dyn ReceiptJournal>>) -> Self {
        Self {
            state: LedgerState::new(config.effective_call_depth()),
            config,
            sequence: 0,
            timestamp: Utc::now(),
            receipts: Vec::new(),
            receipt_index: HashMap::new(),
            journal,
        }
    }

    /// Journal committed receipts to `journal`, replacing any configured one
    pub fn with_journal(mut self, journal: Arc<dyn ReceiptJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Set the clock stamped onto subsequent receipts
    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = timestamp;
    }

    /// Deploy `program` as `from`, at the address given by `from`'s nonce
    pub fn deploy(
        &mut self,
        from: Address,
        program: Arc<dyn Program>,
        args: &[u8],
    ) -> Result<TransactionReceipt, LedgerError> {
        let nonce = self.state.bump_nonce(from);
        let address = derive_create_address(&from, nonce);
        let code_hash = program.code_hash();
        let name = program.name().to_string();

        let mut input = code_hash.to_bytes().to_vec();
        input.extend_from_slice(args);
        let transaction_hash = self.transaction_hash(&from, None, &input);

        match self.state.create(from, address, program, args, 0) {
            Ok(()) => {
                debug!("Deployed {} at {} from {}", name, address, from);
                self.commit(transaction_hash, from, None, Some(address), Vec::new())
            }
            Err(revert) => Err(self.fail(transaction_hash, revert)),
        }
    }

    /// Call `to` as `from`
    pub fn transact(
        &mut self,
        from: Address,
        to: Address,
        input: &[u8],
    ) -> Result<TransactionReceipt, LedgerError> {
        let transaction_hash = self.transaction_hash(&from, Some(&to), input);
        self.state.bump_nonce(from);

        match self.state.execute_frame(Frame::top_level(from, to, false), input) {
            Ok(output) => {
                debug!("Transaction {} from {} to {}", hex::encode(transaction_hash), from, to);
                self.commit(transaction_hash, from, Some(to), None, output)
            }
            Err(revert) => Err(self.fail(transaction_hash, revert)),
        }
    }

    /// Call `to` as `from` in a static frame. Nothing is recorded.
    pub fn view(
        &mut self,
        from: Address,
        to: Address,
        input: &[u8],
    ) -> Result<Vec<u8>, LedgerError> {
        let result = self
            .state
            .execute_frame(Frame::top_level(from, to, true), input);
        self.state.abort();
        Ok(result?)
    }

    pub fn has_code(&self, address: &Address) -> bool {
        self.state.has_code(address)
    }

    pub fn code_hash_at(&self, address: &Address) -> Option<CodeHash> {
        self.state.code_hash_at(address)
    }

    pub fn storage_at(&self, address: &Address, slot: &Slot) -> Option<Vec<u8>> {
        self.state.load(address, slot).map(<[u8]>::to_vec)
    }

    pub fn nonce_of(&self, address: &Address) -> u64 {
        self.state.nonce_of(address)
    }

    pub fn receipt(&self, transaction_hash: &TransactionHash) -> Option<&TransactionReceipt> {
        self.receipt_index
            .get(transaction_hash)
            .and_then(|index| self.receipts.get(*index))
    }

    /// Committed receipts in ledger order
    pub fn receipts(&self) -> &[TransactionReceipt] {
        &self.receipts
    }

    fn transaction_hash(
        &self,
        from: &Address,
        to: Option<&Address>,
        input: &[u8],
    ) -> TransactionHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(TRANSACTION_DOMAIN_TAG);
        hasher.update(&self.config.chain_id.to_le_bytes());
        hasher.update(&self.sequence.to_le_bytes());
        hasher.update(from.bytes());
        match to {
            Some(to) => {
                hasher.update(&[1]);
                hasher.update(to.bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
        hasher.update(input);
        *hasher.finalize().as_bytes()
    }

    fn commit(
        &mut self,
        transaction_hash: TransactionHash,
        from: Address,
        to: Option<Address>,
        contract_address: Option<Address>,
        output: Vec<u8>,
    ) -> Result<TransactionReceipt, LedgerError> {
        let changes = self.state.pending_changes();
        let receipt = TransactionReceipt {
            transaction_hash,
            sequence: self.sequence,
            from,
            to,
            contract_address,
            output,
            logs: changes.logs,
            effects: changes.effects,
            created: changes.created,
            timestamp: self.timestamp,
        };

        // The record must be durable before the state is
        if let Some(journal) = &self.journal {
            if let Err(err) = journal.append(&receipt) {
                warn!(
                    "Dropping transaction {}: journal append failed: {}",
                    hex::encode(transaction_hash),
                    err
                );
                self.state.abort();
                return Err(err);
            }
        }

        self.state.settle();
        self.receipt_index
            .insert(transaction_hash, self.receipts.len());
        self.receipts.push(receipt.clone());
        self.sequence += 1;

        Ok(receipt)
    }

    fn fail(&mut self, transaction_hash: TransactionHash, revert: Revert) -> LedgerError {
        self.state.abort();
        warn!(
            "Transaction {} reverted: {}",
            hex::encode(transaction_hash),
            revert
        );
        LedgerError::Reverted(revert)
    }
}
