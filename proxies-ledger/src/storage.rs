//! Storage slots and typed views over them.
//!
//! Accounts store raw bytes under 32-byte slots. Programs keep fixed values at
//! named slots (the hash of a label, so unrelated layouts never overlap) and
//! mappings at slots derived from a base slot and the encoded key.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::marker::PhantomData;

use crate::context::CallContext;
use crate::error::Revert;

/// Key of one storage entry inside an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Slot([u8; 32]);

impl Slot {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Slot(bytes)
    }

    /// Slot at the hash of a label
    pub fn named(label: &str) -> Self {
        Slot(Sha256::digest(label.as_bytes()).into())
    }

    /// Slot for `key` under this base slot
    pub fn derive(&self, key: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(self.0);
        hasher.update(key);
        Slot(hasher.finalize().into())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot:{}", hex::encode(&self.0[0..6]))
    }
}

/// A single bincode-encoded value at a fixed slot
pub struct StorageValue<T> {
    slot: Slot,
    value: PhantomData<fn() -> T>,
}

impl<T> StorageValue<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(label: &str) -> Self {
        Self::at(Slot::named(label))
    }

    pub fn at(slot: Slot) -> Self {
        Self {
            slot,
            value: PhantomData,
        }
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn get(&self, ctx: &CallContext<'_>) -> Result<Option<T>, Revert> {
        decode(ctx.load(&self.slot))
    }

    pub fn set(&self, ctx: &mut CallContext<'_>, value: &T) -> Result<(), Revert> {
        ctx.store(self.slot, bincode::serialize(value)?)
    }

    pub fn clear(&self, ctx: &mut CallContext<'_>) -> Result<(), Revert> {
        ctx.clear(self.slot)
    }
}

/// A mapping from bincode-encoded keys to bincode-encoded values
pub struct StorageMap<K, V> {
    base: Slot,
    entries: PhantomData<fn() -> (K, V)>,
}

impl<K, V> StorageMap<K, V>
where
    K: Serialize,
    V: Serialize + DeserializeOwned,
{
    pub fn new(label: &str) -> Self {
        Self {
            base: Slot::named(label),
            entries: PhantomData,
        }
    }

    /// Slot holding the value for `key`
    pub fn slot_for(&self, key: &K) -> Result<Slot, Revert> {
        Ok(self.base.derive(&bincode::serialize(key)?))
    }

    pub fn get(&self, ctx: &CallContext<'_>, key: &K) -> Result<Option<V>, Revert> {
        let slot = self.slot_for(key)?;
        decode(ctx.load(&slot))
    }

    pub fn contains(&self, ctx: &CallContext<'_>, key: &K) -> Result<bool, Revert> {
        let slot = self.slot_for(key)?;
        Ok(ctx.load(&slot).is_some())
    }

    pub fn set(&self, ctx: &mut CallContext<'_>, key: &K, value: &V) -> Result<(), Revert> {
        let slot = self.slot_for(key)?;
        ctx.store(slot, bincode::serialize(value)?)
    }

    pub fn remove(&self, ctx: &mut CallContext<'_>, key: &K) -> Result<(), Revert> {
        let slot = self.slot_for(key)?;
        ctx.clear(slot)
    }
}

fn decode<T: DeserializeOwned>(raw: Option<Vec<u8>>) -> Result<Option<T>, Revert> {
    match raw {
        Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
        None => Ok(None),
    }
}
