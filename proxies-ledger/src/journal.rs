//! Append-only receipt journals.
//!
//! The file journal writes each receipt as a little-endian `u64` length followed by
//! the bincode encoding, and flushes before returning so a committed transaction is
//! never acknowledged ahead of its record.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::LedgerError;
use crate::receipt::TransactionReceipt;

/// Largest record the journal will read back
pub const MAX_ENTRY_LEN: u64 = 64 * 1024 * 1024;

/// Iterator over journaled receipts, oldest first
pub type ReceiptIterator<'a> =
    Box<dyn Iterator<Item = Result<TransactionReceipt, LedgerError>> + 'a>;

/// Durable record of committed transactions
pub trait ReceiptJournal: Send + Sync {
    fn append(&self, receipt: &TransactionReceipt) -> Result<(), LedgerError>;

    fn iterate_receipts(&self) -> ReceiptIterator<'_>;
}

/// Receipt journal backed by a single append-only file
pub struct FileReceiptJournal {
    path: PathBuf,
    file: Mutex<BufWriter<File>>,
}

impl FileReceiptJournal {
    /// Open the journal at `path`, creating the file if it does not exist
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)
            .map_err(|e| LedgerError::Journal(format!("Failed to open journal file: {}", e)))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReceiptJournal for FileReceiptJournal {
    fn append(&self, receipt: &TransactionReceipt) -> Result<(), LedgerError> {
        let mut file = self
            .file
            .lock()
            .map_err(|e| LedgerError::Journal(format!("Failed to acquire lock: {}", e)))?;

        let serialized = bincode::serialize(receipt)?;
        let entry_len = serialized.len() as u64;
        if entry_len > MAX_ENTRY_LEN {
            return Err(LedgerError::Journal(format!(
                "Receipt of {} bytes exceeds the journal entry limit",
                entry_len
            )));
        }

        // Length and data go out in one write so a failure never leaves half a header
        let mut entry = Vec::with_capacity(8 + serialized.len());
        entry.extend_from_slice(&entry_len.to_le_bytes());
        entry.extend_from_slice(&serialized);
        file.write_all(&entry)?;
        file.flush()?;

        Ok(())
    }

    fn iterate_receipts(&self) -> ReceiptIterator<'_> {
        match File::open(&self.path) {
            Ok(file) => Box::new(JournalEntryIterator {
                reader: BufReader::new(file),
            }),
            Err(e) => Box::new(std::iter::once(Err(LedgerError::Io(e)))),
        }
    }
}

struct JournalEntryIterator {
    reader: BufReader<File>,
}

impl Iterator for JournalEntryIterator {
    type Item = Result<TransactionReceipt, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut len_buf = [0u8; 8];
        match self.reader.read_exact(&mut len_buf) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // End of file
                return None;
            }
            Err(e) => return Some(Err(LedgerError::from(e))),
        }

        let entry_len = u64::from_le_bytes(len_buf);
        if entry_len > MAX_ENTRY_LEN {
            return Some(Err(LedgerError::Journal(format!(
                "Corrupt journal entry length {}",
                entry_len
            ))));
        }

        let mut entry_data = vec![0u8; entry_len as usize];
        if let Err(e) = self.reader.read_exact(&mut entry_data) {
            return Some(Err(LedgerError::from(e)));
        }

        Some(bincode::deserialize(&entry_data).map_err(LedgerError::from))
    }
}

/// Receipt journal kept in memory, for tests and throwaway ledgers
#[derive(Default)]
pub struct InMemoryReceiptJournal {
    receipts: Mutex<Vec<TransactionReceipt>>,
}

impl InMemoryReceiptJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.receipts.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReceiptJournal for InMemoryReceiptJournal {
    fn append(&self, receipt: &TransactionReceipt) -> Result<(), LedgerError> {
        let mut receipts = self
            .receipts
            .lock()
            .map_err(|e| LedgerError::Journal(format!("Failed to acquire lock: {}", e)))?;
        receipts.push(receipt.clone());
        Ok(())
    }

    fn iterate_receipts(&self) -> ReceiptIterator<'_> {
        match self.receipts.lock() {
            Ok(receipts) => Box::new(receipts.clone().into_iter().map(Ok)),
            Err(e) => Box::new(std::iter::once(Err(LedgerError::Journal(format!(
                "Failed to acquire lock: {}",
                e
            ))))),
        }
    }
}
