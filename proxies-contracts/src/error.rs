use proxies_core::{Address, ImplementationId};
use proxies_ledger::{LedgerError, Revert};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marks revert data produced by registry programs
pub const REASON_PREFIX: &[u8] = b"PROXIES_Err";

/// Why a registry operation was rejected.
///
/// Carried as `Revert::Program` data, so a rejection surfaces unchanged to the
/// transaction sender no matter how many frames it crosses.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryError {
    #[error("caller is not the owner")]
    NotOwner,

    #[error("caller is neither an admin nor the owner")]
    NotAdminOrOwner,

    #[error("caller is not an approved deployer")]
    NotApprovedDeployer,

    /// The target address already has code
    #[error("address {0} already has code")]
    DuplicateDeployment(Address),

    #[error("relationship {0} already exists")]
    RelationshipExists(ImplementationId),

    #[error("relationship {0} not found")]
    RelationshipNotFound(ImplementationId),

    /// The address is not a direct proxy deployed by this manager
    #[error("no direct proxy at {0}")]
    ProxyNotFound(Address),

    #[error("implementation is locked")]
    AlreadyLocked,

    /// The address has no code to run
    #[error("invalid implementation {0}")]
    InvalidImplementation(Address),

    /// A proxy was called before it had an implementation
    #[error("implementation not set")]
    ImplementationNotSet,

    #[error("malformed call data")]
    MalformedCall,
}

/// Coarse failure classes, stable across releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    PermissionDenied,
    DuplicateDeployment,
    NotFound,
    AlreadyLocked,
    InvalidImplementation,
    Malformed,
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::NotOwner
            | RegistryError::NotAdminOrOwner
            | RegistryError::NotApprovedDeployer => ErrorKind::PermissionDenied,
            RegistryError::DuplicateDeployment(_) | RegistryError::RelationshipExists(_) => {
                ErrorKind::DuplicateDeployment
            }
            RegistryError::RelationshipNotFound(_) | RegistryError::ProxyNotFound(_) => {
                ErrorKind::NotFound
            }
            RegistryError::AlreadyLocked => ErrorKind::AlreadyLocked,
            RegistryError::InvalidImplementation(_) | RegistryError::ImplementationNotSet => {
                ErrorKind::InvalidImplementation
            }
            RegistryError::MalformedCall => ErrorKind::Malformed,
        }
    }

    /// Machine-checkable reason tag
    pub fn reason(&self) -> &'static str {
        match self {
            RegistryError::NotOwner => "ERR_NOT_OWNER",
            RegistryError::NotAdminOrOwner => "ERR_NOT_ADMIN_OR_OWNER",
            RegistryError::NotApprovedDeployer => "ERR_NOT_APPROVED_DEPLOYER",
            RegistryError::DuplicateDeployment(_) | RegistryError::RelationshipExists(_) => {
                "ERR_DUPLICATE_DEPLOYMENT"
            }
            RegistryError::RelationshipNotFound(_) | RegistryError::ProxyNotFound(_) => {
                "ERR_NOT_FOUND"
            }
            RegistryError::AlreadyLocked => "ERR_ALREADY_LOCKED",
            RegistryError::InvalidImplementation(_) => "ERR_INVALID_IMPLEMENTATION",
            RegistryError::ImplementationNotSet => "ERR_IMPLEMENTATION_NOT_SET",
            RegistryError::MalformedCall => "ERR_MALFORMED_CALL",
        }
    }

    pub fn to_revert_data(&self) -> Vec<u8> {
        let mut data = REASON_PREFIX.to_vec();
        // Encoding a registry error cannot fail
        if let Ok(encoded) = bincode::serialize(self) {
            data.extend_from_slice(&encoded);
        }
        data
    }

    /// Decode revert data produced by `to_revert_data`
    pub fn from_revert_data(data: &[u8]) -> Option<Self> {
        let encoded = data.strip_prefix(REASON_PREFIX)?;
        bincode::deserialize(encoded).ok()
    }

    /// The registry error behind a revert, if a registry program raised it
    pub fn from_revert(revert: &Revert) -> Option<Self> {
        revert.program_data().and_then(Self::from_revert_data)
    }
}

impl From<RegistryError> for Revert {
    fn from(err: RegistryError) -> Self {
        Revert::Program(err.to_revert_data())
    }
}

/// Errors returned by the typed clients
#[derive(Error, Debug)]
pub enum ClientError {
    /// A registry program rejected the call
    #[error("registry error: {0}")]
    Registry(RegistryError),

    #[error("ledger error: {0}")]
    Ledger(LedgerError),

    /// A call succeeded but its output could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn registry(&self) -> Option<&RegistryError> {
        match self {
            ClientError::Registry(err) => Some(err),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.registry().map(RegistryError::kind)
    }
}

impl ClientError {
    /// Classify the failure of a call sent straight to a manager or gateway.
    ///
    /// Registry accounts never forward into logic code, so registry reason data in
    /// such a revert was raised by a registry program. Failures of calls to any other
    /// account go through `From<LedgerError>` and are never read as registry errors.
    pub fn from_registry_call(err: LedgerError) -> Self {
        match err.revert().and_then(RegistryError::from_revert) {
            Some(registry) => ClientError::Registry(registry),
            None => ClientError::Ledger(err),
        }
    }
}

impl From<LedgerError> for ClientError {
    fn from(err: LedgerError) -> Self {
        ClientError::Ledger(err)
    }
}

impl From<bincode::Error> for ClientError {
    fn from(err: bincode::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
