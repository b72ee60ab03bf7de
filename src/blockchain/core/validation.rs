use crate::error::ChainError;
use std::fmt;
use tracing::{debug, warn};

use super::chain::{Block, MAX_TRANSACTIONS_PER_BLOCK};

/// What a failed integrity check found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Violation {
    /// `previous_hash` does not match the predecessor's stored hash.
    ChainBroken,
    /// Stored Merkle root differs from the root of the current transactions.
    MerkleMismatch,
    /// Stored hash differs from the digest of the current header.
    HashMismatch,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::ChainBroken => write!(f, "Chain linkage broken"),
            Violation::MerkleMismatch => write!(f, "Merkle root mismatch"),
            Violation::HashMismatch => write!(f, "Block hash mismatch"),
        }
    }
}

/// Outcome of a whole-chain integrity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verification {
    Valid,
    Invalid { index: u64, violation: Violation },
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid)
    }

    /// `Invalid` as `ChainError::IntegrityViolation`, for callers using `?`.
    pub fn into_result(self) -> Result<(), ChainError> {
        match self {
            Verification::Valid => Ok(()),
            Verification::Invalid { index, violation } => {
                Err(ChainError::IntegrityViolation { index, violation })
            }
        }
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verification::Valid => write!(f, "Chain integrity verified"),
            Verification::Invalid { index, violation } => {
                write!(f, "{} at block {}", violation, index)
            }
        }
    }
}

/// Check `block` against its predecessor: linkage, then Merkle root, then
/// self digest.
pub fn check_block(previous: &Block, block: &Block) -> Option<Violation> {
    if block.header.previous_hash != previous.hash {
        return Some(Violation::ChainBroken);
    }
    if block.compute_merkle_root() != block.header.merkle_root {
        return Some(Violation::MerkleMismatch);
    }
    if block.compute_hash() != block.hash {
        return Some(Violation::HashMismatch);
    }
    None
}

/// Verify every block after the first against its predecessor.
pub fn verify_blocks(blocks: &[Block]) -> Verification {
    for pair in blocks.windows(2) {
        let (previous, block) = (&pair[0], &pair[1]);
        if let Some(violation) = check_block(previous, block) {
            warn!(index = block.index(), %violation, "Chain integrity compromised");
            return Verification::Invalid {
                index: block.index(),
                violation,
            };
        }
    }
    debug!(blocks = blocks.len(), "Chain integrity verified");
    Verification::Valid
}

/// Admission check for a block about to be appended after `tip`.
pub fn validate_successor(tip: &Block, block: &Block) -> Result<(), ChainError> {
    let expected_index = tip.index() + 1;
    if block.index() != expected_index {
        return Err(ChainError::InvalidBlock(format!(
            "Invalid block index. Expected {}, but got {}.",
            expected_index,
            block.index()
        )));
    }

    if block.transactions.len() > MAX_TRANSACTIONS_PER_BLOCK {
        return Err(ChainError::CapacityExceeded {
            capacity: MAX_TRANSACTIONS_PER_BLOCK,
        });
    }

    match check_block(tip, block) {
        None => Ok(()),
        Some(Violation::ChainBroken) => Err(ChainError::InvalidBlock(format!(
            "Invalid previous block hash. Expected {}, but got {}.",
            tip.hash,
            block.header.previous_hash
        ))),
        Some(Violation::MerkleMismatch) => Err(ChainError::InvalidBlock(format!(
            "Merkle root mismatch. Expected {}, but got {}.",
            block.compute_merkle_root(),
            block.header.merkle_root
        ))),
        Some(Violation::HashMismatch) => Err(ChainError::InvalidBlock(format!(
            "Block is not sealed. Expected hash {}, but got {}.",
            block.compute_hash(),
            block.hash
        ))),
    }
}
