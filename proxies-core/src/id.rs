use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use crate::error::ParseIdError;

/// Width of an account address in bytes.
pub const ADDRESS_LENGTH: usize = 20;

// Address identifies an account on the ledger: an external actor, a logic unit,
// a proxy or a holder. The all-zero address is the "unset" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The unset address
    pub const ZERO: Address = Address([0; ADDRESS_LENGTH]);

    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }

    /// Build an address from the trailing bytes of a 32-byte digest
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&digest[32 - ADDRESS_LENGTH..]);
        Address(bytes)
    }

    /// Create an address from an arbitrary slice, which must be exactly 20 bytes long
    pub fn from_slice(slice: &[u8]) -> Result<Self, ParseIdError> {
        let bytes: [u8; ADDRESS_LENGTH] = slice
            .try_into()
            .map_err(|_| ParseIdError::InvalidLength {
                expected: ADDRESS_LENGTH,
                actual: slice.len(),
            })?;
        Ok(Address(bytes))
    }

    /// Deterministic address for a named external account.
    ///
    /// Ledger accounts that are not programs (operators, admins, deployers) have no
    /// derivation of their own, so integrations and tests name them instead.
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"PROXIES_Account");
        hasher.update(label.as_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        Address::from_digest(&digest)
    }

    /// Get a reference to the internal bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Address::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| ParseIdError::InvalidHex(e.to_string()))?;
        Address::from_slice(&bytes)
    }
}

impl Deref for Address {
    type Target = [u8; ADDRESS_LENGTH];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

macro_rules! bytes32_id {
    ($(#[$meta:meta])* $name:ident, $domain:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        pub struct $name([u8; 32]);

        impl $name {
            pub const fn new(bytes: [u8; 32]) -> Self {
                $name(bytes)
            }

            /// SHA-256 of a UTF-8 label, for identifiers chosen by name
            pub fn from_label(label: &str) -> Self {
                $name(Sha256::digest(label.as_bytes()).into())
            }

            /// Get a reference to the internal bytes
            pub fn bytes(&self) -> &[u8] {
                &self.0
            }

            pub fn to_bytes(self) -> [u8; 32] {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // Prefix plus the first 6 bytes is enough to tell values apart in logs
                write!(f, "{}:{}", $domain, hex::encode(&self.0[0..6]))
            }
        }

        impl Deref for $name {
            type Target = [u8; 32];

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                $name(bytes)
            }
        }
    };
}

bytes32_id!(
    /// Caller-chosen value mixed into address derivation
    Salt,
    "salt"
);

bytes32_id!(
    /// Identifier of a many-to-one relationship, unique per manager
    ImplementationId,
    "impl"
);

bytes32_id!(
    /// SHA-256 of a program's byte image
    CodeHash,
    "code"
);

impl CodeHash {
    /// Hash a byte image
    pub fn of(image: &[u8]) -> Self {
        CodeHash(Sha256::digest(image).into())
    }
}

impl From<ImplementationId> for Salt {
    fn from(id: ImplementationId) -> Self {
        Salt(id.0)
    }
}
