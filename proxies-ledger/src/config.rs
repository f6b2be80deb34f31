use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Deepest call nesting a ledger accepts. Frames recurse on the native stack.
pub const MAX_CALL_DEPTH: usize = 1024;

/// Settings of a ledger instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Mixed into every transaction hash so receipts from different ledgers never collide
    pub chain_id: u64,

    /// Deepest nesting of calls and deployments a transaction may reach
    pub max_call_depth: usize,

    /// Where committed receipts are journaled. No journal when unset.
    pub journal_path: Option<PathBuf>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            max_call_depth: 64,
            journal_path: None,
        }
    }
}

impl LedgerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse ledger configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_call_depth == 0 || self.max_call_depth > MAX_CALL_DEPTH {
            bail!(
                "max_call_depth must be between 1 and {}, got {}",
                MAX_CALL_DEPTH,
                self.max_call_depth
            );
        }
        Ok(())
    }

    /// `max_call_depth` clamped to what the ledger supports
    pub fn effective_call_depth(&self) -> usize {
        self.max_call_depth.min(MAX_CALL_DEPTH)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read ledger configuration from {}", path.display())
        })?;
        Self::from_json_str(&json)
            .with_context(|| format!("Invalid ledger configuration in {}", path.display()))
    }
}
