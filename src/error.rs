//! Error types for the ledger

use crate::blockchain::Violation;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("Transaction rejected: {0}")]
    ParseRejected(String),
    #[error("Block is full ({capacity} transactions)")]
    CapacityExceeded { capacity: usize },
    #[error("Invalid block: {0}")]
    InvalidBlock(String),
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),
    #[error("Integrity violation at block {index}: {violation}")]
    IntegrityViolation { index: u64, violation: Violation },
    #[error("Block not found: {0}")]
    BlockNotFound(u64),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::IoError(format!("JSON encoding failed: {}", err))
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
