use crate::crypto::{sha256, sha256_concat, Digest};
use crate::error::ChainError;
use crate::merkle::merkle_root;
use crate::transaction::{parse_transaction, Transaction};
use tracing::{debug, warn};

use super::state::LedgerStats;
use super::validation::{validate_successor, verify_blocks, Verification};

/// Maximum number of transactions a block can hold.
pub const MAX_TRANSACTIONS_PER_BLOCK: usize = 10;

/// Timestamp of every genesis block (2023-01-01T00:00:00Z), so independently
/// created chains start from the same genesis digest.
pub const GENESIS_TIMESTAMP: i64 = 1_672_531_200;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlockHeader {
    pub index: u64,
    /// Unix seconds.
    pub timestamp: i64,
    pub previous_hash: Digest,
    pub merkle_root: Digest,
}

impl BlockHeader {
    /// Self-digest preimage: index and timestamp in decimal followed by the
    /// predecessor digest and Merkle root in hex, with no separators.
    ///
    /// Sealing and verification both go through here.
    pub fn hash_preimage(&self) -> String {
        format!(
            "{}{}{}{}",
            self.index,
            self.timestamp,
            self.previous_hash.to_hex(),
            self.merkle_root.to_hex()
        )
    }

    pub fn hash(&self) -> Digest {
        sha256(self.hash_preimage())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    /// Stored self digest; only `seal` writes it.
    pub hash: Digest,
}

impl Block {
    /// An empty, unsealed block stamped with the current time.
    pub fn new(index: u64, previous_hash: Digest) -> Self {
        let timestamp = chrono::Utc::now().timestamp();
        Self::with_timestamp(index, previous_hash, timestamp)
    }

    pub fn with_timestamp(index: u64, previous_hash: Digest, timestamp: i64) -> Self {
        Block {
            header: BlockHeader {
                index,
                timestamp,
                previous_hash,
                merkle_root: Digest::ZERO,
            },
            transactions: Vec::with_capacity(MAX_TRANSACTIONS_PER_BLOCK),
            hash: Digest::ZERO,
        }
    }

    pub fn index(&self) -> u64 {
        self.header.index
    }

    pub fn timestamp(&self) -> i64 {
        self.header.timestamp
    }

    pub fn previous_hash(&self) -> &Digest {
        &self.header.previous_hash
    }

    pub fn merkle_root(&self) -> &Digest {
        &self.header.merkle_root
    }

    /// Stored self digest, as last written by `seal`.
    pub fn hash(&self) -> &Digest {
        &self.hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn is_full(&self) -> bool {
        self.transactions.len() >= MAX_TRANSACTIONS_PER_BLOCK
    }

    /// Parse `raw` and append it, resealing the block.
    ///
    /// The block is left untouched when it is full or `raw` does not parse.
    pub fn append_transaction(&mut self, raw: &str) -> Result<(), ChainError> {
        self.ensure_capacity()?;
        let tx = parse_transaction(raw).inspect_err(|e| {
            warn!(block = self.header.index, "Rejected transaction: {}", e);
        })?;
        self.push_transaction(tx)
    }

    /// Append an already parsed transaction, resealing the block.
    pub fn push_transaction(&mut self, tx: Transaction) -> Result<(), ChainError> {
        self.ensure_capacity()?;
        tx.validate()?;
        self.transactions.push(tx);
        self.seal();
        Ok(())
    }

    fn ensure_capacity(&self) -> Result<(), ChainError> {
        if self.is_full() {
            warn!(block = self.header.index, "Transaction limit reached");
            return Err(ChainError::CapacityExceeded {
                capacity: MAX_TRANSACTIONS_PER_BLOCK,
            });
        }
        Ok(())
    }

    /// Recompute the Merkle root from the current transactions, then the
    /// self digest from the header.
    pub fn seal(&mut self) {
        self.header.merkle_root = self.compute_merkle_root();
        self.hash = self.header.hash();
        debug!(
            block = self.header.index,
            transactions = self.transactions.len(),
            hash = %self.hash.short(16),
            "Sealed block"
        );
    }

    /// Merkle root of the current transactions, without storing it.
    pub fn compute_merkle_root(&self) -> Digest {
        merkle_root(&self.transactions)
    }

    /// Self digest of the current header fields, without storing it.
    pub fn compute_hash(&self) -> Digest {
        self.header.hash()
    }

    /// Sum of the amounts in this block.
    pub fn total_value(&self) -> u128 {
        self.transactions.iter().map(|tx| u128::from(tx.amount)).sum()
    }
}

/// An append-only sequence of sealed blocks starting at a genesis block.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Blockchain {
    blocks: Vec<Block>,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// Create a chain holding only the sealed genesis block.
    pub fn new() -> Self {
        Blockchain {
            blocks: vec![Self::create_genesis_block()],
        }
    }

    fn create_genesis_block() -> Block {
        let mut genesis = Block::with_timestamp(0, Digest::ZERO, GENESIS_TIMESTAMP);
        genesis.seal();
        genesis
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false for a chain built through `new`.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    /// The last block, which is still open for transactions.
    pub fn tip(&self) -> &Block {
        // `blocks` always holds at least the genesis block.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Mutable access that bypasses sealing. Edits made here are exactly what
    /// `verify_integrity` reports.
    pub fn block_mut(&mut self, index: u64) -> Option<&mut Block> {
        usize::try_from(index).ok().and_then(move |i| self.blocks.get_mut(i))
    }

    /// An empty sealed block linked to the current tip, not yet appended.
    pub fn next_block(&self) -> Block {
        let tip = self.tip();
        let mut block = Block::new(tip.index() + 1, tip.hash);
        block.seal();
        block
    }

    /// Append a sealed block that links to the current tip.
    ///
    /// The chain is unchanged when the block is rejected.
    pub fn append_block(&mut self, block: Block) -> Result<(), ChainError> {
        validate_successor(self.tip(), &block).inspect_err(|e| {
            warn!(index = block.index(), "Rejected block: {}", e);
        })?;
        debug!(index = block.index(), hash = %block.hash.short(16), "Appended block");
        self.blocks.push(block);
        Ok(())
    }

    /// Append a transaction to the tip block.
    pub fn append_transaction(&mut self, raw: &str) -> Result<(), ChainError> {
        let last = self.blocks.len() - 1;
        self.blocks[last].append_transaction(raw)
    }

    /// Close the tip by appending a fresh empty block after it. Returns the
    /// new block's index.
    pub fn open_block(&mut self) -> Result<u64, ChainError> {
        if self.tip().transactions.is_empty() {
            return Err(ChainError::InvalidBlock(
                "Cannot create a new block while the current block is empty".to_string(),
            ));
        }
        let block = self.next_block();
        let index = block.index();
        self.append_block(block)?;
        Ok(index)
    }

    /// Check linkage, Merkle roots and self digests of every block after
    /// genesis, stopping at the first violation. Never mutates the chain.
    pub fn verify_integrity(&self) -> Verification {
        verify_blocks(&self.blocks)
    }

    /// Digest of every block hash concatenated in order.
    pub fn fingerprint(&self) -> Digest {
        sha256_concat(self.blocks.iter().map(|b| b.hash.to_hex()))
    }

    pub fn transaction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.transactions.len()).sum()
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats::from_blocks(&self.blocks)
    }
}
