pub mod config;
pub mod context;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod program;
pub mod receipt;
pub mod state;
pub mod storage;

// Re-export the main types for convenience
pub use config::{LedgerConfig, MAX_CALL_DEPTH};
pub use context::{CallContext, Frame};
pub use error::{Fault, LedgerError, Revert};
pub use journal::{FileReceiptJournal, InMemoryReceiptJournal, ReceiptIterator, ReceiptJournal};
pub use ledger::Ledger;
pub use program::Program;
pub use receipt::{Log, StorageEffect, TransactionHash, TransactionReceipt};
pub use state::{Account, LedgerState};
pub use storage::{Slot, StorageMap, StorageValue};
