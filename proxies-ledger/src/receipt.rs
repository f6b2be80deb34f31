use chrono::{DateTime, Utc};
use proxies_core::Address;
use serde::{Deserialize, Serialize};

use crate::storage::Slot;

/// Hash of a committed transaction
pub type TransactionHash = [u8; 32];

/// Event data emitted by a program, tagged with the account it ran against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Account whose storage the emitting frame was using
    pub address: Address,
    pub data: Vec<u8>,
}

/// One storage slot changed by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEffect {
    pub address: Address,
    pub slot: Slot,

    /// The value before the transaction (None if the slot was empty)
    pub before_image: Option<Vec<u8>>,

    /// The value after the transaction (None if the slot was cleared)
    pub after_image: Option<Vec<u8>>,
}

/// Record of a committed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: TransactionHash,

    /// Position of the transaction in the ledger's total order
    pub sequence: u64,

    /// The account that submitted the transaction
    pub from: Address,

    /// The called account, or None for a deployment
    pub to: Option<Address>,

    /// The account created by a deployment transaction
    pub contract_address: Option<Address>,

    /// Bytes returned by the top-level call
    pub output: Vec<u8>,

    /// Events in emission order
    pub logs: Vec<Log>,

    /// Net storage changes, one per touched slot
    pub effects: Vec<StorageEffect>,

    /// Every account that received a program during the transaction
    pub created: Vec<Address>,

    pub timestamp: DateTime<Utc>,
}

impl TransactionReceipt {
    /// Logs emitted under a particular account
    pub fn logs_from<'a>(&'a self, address: &'a Address) -> impl Iterator<Item = &'a Log> + 'a {
        self.logs.iter().filter(move |log| &log.address == address)
    }

    pub fn transaction_hash_hex(&self) -> String {
        hex::encode(self.transaction_hash)
    }
}
