//! Configuration for opening a store

use jagstore_formats::definition::{DecoderOptions, UnknownOpcodePolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Result;
use crate::layout::Generation;

/// Whether the store may be modified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Reads only; writes fail with [`StorageError::ReadOnly`](crate::StorageError::ReadOnly)
    #[default]
    ReadOnly,
    /// Reads and writes
    ReadWrite,
}

impl AccessMode {
    /// Whether writes are allowed
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

/// How index and data lengths that disagree are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthPolicy {
    /// Reject an index file with a partial trailing entry and any archive
    /// whose chain is shorter than its declared length
    #[default]
    Strict,
    /// Ignore a partial trailing index entry and cut archives whose chain
    /// runs past the end of the data file down to the bytes present
    Truncate,
}

/// Configuration for [`Store::open`](crate::Store::open)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the backing files
    pub path: PathBuf,

    /// Layout generation, detected from the data file name when unset
    pub generation: Option<Generation>,

    /// Read-only or read-write
    pub access: AccessMode,

    /// Handling of length mismatches
    pub length_policy: LengthPolicy,

    /// Check loaded archives against the reference table or versionlist
    pub verify_checksums: bool,

    /// Keep decoded archives for the lifetime of the store
    pub memoize: bool,

    /// Handling of opcodes a definition family does not know
    pub unknown_opcodes: UnknownOpcodePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./cache"),
            generation: None,
            access: AccessMode::ReadOnly,
            length_policy: LengthPolicy::Strict,
            verify_checksums: true,
            memoize: true,
            unknown_opcodes: UnknownOpcodePolicy::Fail,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with the specified store directory
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Set the store directory
    #[must_use]
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    /// Force a layout generation instead of detecting it
    #[must_use]
    pub const fn with_generation(mut self, generation: Generation) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Set the access mode
    #[must_use]
    pub const fn with_access(mut self, access: AccessMode) -> Self {
        self.access = access;
        self
    }

    /// Open for reading and writing
    #[must_use]
    pub const fn writable(self) -> Self {
        self.with_access(AccessMode::ReadWrite)
    }

    /// Set the length mismatch policy
    #[must_use]
    pub const fn with_length_policy(mut self, policy: LengthPolicy) -> Self {
        self.length_policy = policy;
        self
    }

    /// Enable or disable checksum verification on load
    #[must_use]
    pub const fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Enable or disable the decoded archive memo
    #[must_use]
    pub const fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// Set the unknown opcode policy for definition lookups
    #[must_use]
    pub const fn with_unknown_opcodes(mut self, policy: UnknownOpcodePolicy) -> Self {
        self.unknown_opcodes = policy;
        self
    }

    /// Decoder options derived from this configuration
    pub fn decoder_options(&self) -> DecoderOptions {
        DecoderOptions::default().with_unknown_opcodes(self.unknown_opcodes)
    }
}
