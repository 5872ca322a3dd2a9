//! Definition decoding errors

use thiserror::Error;

use super::DefinitionKind;

/// Definition decoding result type
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors raised while decoding a definition record
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Opcode not in the entity's table
    #[error("unknown opcode {opcode} in {kind} {id} at offset {offset}")]
    UnknownOpcode {
        /// Offending opcode
        opcode: u8,
        /// Entity family being decoded
        kind: DefinitionKind,
        /// Record id
        id: u32,
        /// Offset of the opcode byte
        offset: u64,
    },

    /// Field payload ran past the end of the record
    #[error("{kind} {id}: opcode {opcode} at offset {offset} is truncated: {source}")]
    TruncatedField {
        /// Opcode whose payload was being read
        opcode: u8,
        /// Entity family being decoded
        kind: DefinitionKind,
        /// Record id
        id: u32,
        /// Offset of the opcode byte
        offset: u64,
        /// Underlying read error
        #[source]
        source: std::io::Error,
    },

    /// Record ended without the terminating opcode 0
    #[error("{kind} {id} ends at offset {offset} without a terminator")]
    MissingTerminator {
        /// Entity family being decoded
        kind: DefinitionKind,
        /// Record id
        id: u32,
        /// Offset where an opcode was expected
        offset: u64,
    },

    /// Legacy `.idx` entry is malformed or disagrees with its `.dat`
    #[error("{kind} legacy index is malformed: {reason}")]
    LegacyIndex {
        /// Entity family
        kind: DefinitionKind,
        /// What is wrong
        reason: String,
    },
}

impl DecodeError {
    /// Opcode implicated by the failure, if any
    pub fn opcode(&self) -> Option<u8> {
        match self {
            Self::UnknownOpcode { opcode, .. } | Self::TruncatedField { opcode, .. } => {
                Some(*opcode)
            }
            _ => None,
        }
    }
}
