//! Ledgerchain - an append-only, tamper-evident ledger
//!
//! Blocks commit up to ten transactions through a Merkle root and link to
//! their predecessor by hash; whole-chain verification reports the first
//! block whose linkage, Merkle root or self digest no longer matches.
//!
//! # Architecture
//!
//! ## Integrity Engine
//! - [`crypto`] - SHA-256 digests and their hex form
//! - [`merkle`] - Merkle tree over transaction encodings
//! - [`blockchain`] - Blocks, the chain, and integrity verification
//! - [`transaction`] - Transaction records and the sentence codec
//!
//! ## Tooling
//! - [`simulation`] - Scenario runner (writes, corrections, tampering, replicas)
//! - [`cli`] - Tracing setup and console rendering
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Integrity Engine
// ============================================================================
pub mod blockchain;
pub mod crypto;
pub mod merkle;
pub mod transaction;

// ============================================================================
// Tooling
// ============================================================================
pub mod cli;
pub mod simulation;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use blockchain::{Block, BlockHeader, Blockchain, Verification, Violation};
pub use crypto::Digest;
pub use error::{ChainError, Result};
pub use transaction::Transaction;
