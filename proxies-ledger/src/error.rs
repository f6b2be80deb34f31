use proxies_core::Address;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Failure raised by the ledger itself rather than by program code
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fault {
    /// A call or delegate call targeted an account without a program
    #[error("no code at {0}")]
    NoCode(Address),

    /// A deployment targeted an account that already has a program
    #[error("address {0} already has code")]
    AddressOccupied(Address),

    #[error("call depth limit of {0} exceeded")]
    CallDepthExceeded(usize),

    /// Storage write, deployment or event emitted from a static frame
    #[error("state change attempted in a static call")]
    StaticStateChange,

    /// Call data or a storage value could not be encoded or decoded
    #[error("codec error: {0}")]
    Codec(String),
}

/// Why a call frame failed. Reverts travel up the call stack unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Revert {
    /// Reason chosen by the failing program, opaque to the ledger
    #[error("program reverted with {} bytes of reason data", .0.len())]
    Program(Vec<u8>),

    #[error("{0}")]
    Fault(#[from] Fault),
}

impl Revert {
    /// Revert with program-defined reason data
    pub fn program(data: impl Into<Vec<u8>>) -> Self {
        Revert::Program(data.into())
    }

    /// Reason data of a program revert
    pub fn program_data(&self) -> Option<&[u8]> {
        match self {
            Revert::Program(data) => Some(data),
            Revert::Fault(_) => None,
        }
    }

    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Revert::Program(_) => None,
            Revert::Fault(fault) => Some(fault),
        }
    }
}

impl From<bincode::Error> for Revert {
    fn from(err: bincode::Error) -> Self {
        Revert::Fault(Fault::Codec(err.to_string()))
    }
}

/// Errors surfaced to whoever submits transactions to the ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The transaction failed and none of its effects were kept
    #[error("transaction reverted: {0}")]
    Reverted(#[from] Revert),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The receipt journal could not be written or read
    #[error("Journal error: {0}")]
    Journal(String),
}

impl LedgerError {
    /// The revert behind a failed transaction, if that is what this is
    pub fn revert(&self) -> Option<&Revert> {
        match self {
            LedgerError::Reverted(revert) => Some(revert),
            _ => None,
        }
    }
}

impl From<bincode::Error> for LedgerError {
    fn from(err: bincode::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}
