// core.rs splits responsibilities into submodules for easier maintenance.
pub mod chain;
pub mod state;
pub mod validation;

pub use chain::*;
pub use state::*;
pub use validation::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{sha256, Digest};
    use crate::error::ChainError;

    fn chain_with_blocks(block_count: usize) -> Blockchain {
        let mut chain = Blockchain::new();
        chain.append_transaction("Alice sends 50 DA to Bob").unwrap();
        for i in 1..block_count {
            let mut block = chain.next_block();
            block
                .append_transaction(&format!("Node{} sends {} DA to Bob", i, i * 10))
                .unwrap();
            block.append_transaction("Carol sends 5 DA to Dave").unwrap();
            chain.append_block(block).unwrap();
        }
        chain
    }

    #[test]
    fn test_new_block_is_empty_and_unsealed() {
        let block = Block::new(3, sha256("prev"));
        assert_eq!(block.index(), 3);
        assert!(block.transactions().is_empty());
        assert_eq!(*block.merkle_root(), Digest::ZERO);
        assert_eq!(block.hash, Digest::ZERO);
        assert!(block.timestamp() > GENESIS_TIMESTAMP);
    }

    #[test]
    fn test_append_transaction_reseals() {
        let mut block = Block::with_timestamp(1, sha256("prev"), 1_700_000_000);
        block.append_transaction("Alice sends 50 DA to Bob").unwrap();
        assert_eq!(block.transactions().len(), 1);
        assert_eq!(*block.merkle_root(), block.compute_merkle_root());
        assert_eq!(block.hash, block.compute_hash());

        let first_hash = block.hash;
        block.append_transaction("Bob sends 20 DA to Carol").unwrap();
        assert_ne!(block.hash, first_hash);
        assert_eq!(block.hash, block.compute_hash());
    }

    #[test]
    fn test_block_hash_preimage_has_no_separators() {
        let prev = sha256("prev");
        let mut block = Block::with_timestamp(7, prev, 1_700_000_000);
        block.append_transaction("Alice sends 50 DA to Bob").unwrap();

        let expected_preimage = format!(
            "7{}{}{}",
            1_700_000_000,
            prev.to_hex(),
            block.merkle_root().to_hex()
        );
        assert_eq!(block.header.hash_preimage(), expected_preimage);
        assert_eq!(block.hash, sha256(&expected_preimage));
    }

    #[test]
    fn test_rejected_transaction_leaves_block_unchanged() {
        let mut block = Block::with_timestamp(1, sha256("prev"), 1_700_000_000);
        block.append_transaction("Alice sends 50 DA to Bob").unwrap();
        let before = block.clone();

        let err = block.append_transaction("Alice sends nothing").unwrap_err();
        assert!(matches!(err, ChainError::ParseRejected(_)));
        let err = block.append_transaction("Alice sends 0 DA to Bob").unwrap_err();
        assert!(matches!(err, ChainError::ParseRejected(_)));
        assert_eq!(block, before);
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut block = Block::with_timestamp(1, sha256("prev"), 1_700_000_000);
        for i in 1..=MAX_TRANSACTIONS_PER_BLOCK {
            block
                .append_transaction(&format!("Alice sends {} DA to Bob", i))
                .unwrap();
        }
        assert!(block.is_full());
        let before = block.clone();

        let err = block.append_transaction("Alice sends 1 DA to Bob").unwrap_err();
        assert_eq!(
            err,
            ChainError::CapacityExceeded {
                capacity: MAX_TRANSACTIONS_PER_BLOCK
            }
        );
        // Capacity is checked before parsing.
        let err = block.append_transaction("garbage").unwrap_err();
        assert!(matches!(err, ChainError::CapacityExceeded { .. }));
        assert_eq!(block, before);
    }

    #[test]
    fn test_block_clone_is_independent() {
        let mut original = Block::with_timestamp(1, sha256("prev"), 1_700_000_000);
        original.append_transaction("Alice sends 50 DA to Bob").unwrap();
        let mut fork = original.clone();

        fork.append_transaction("Attacker sends 1000 DA to Merchant2").unwrap();
        fork.transactions[0].receiver = "Mallory".to_string();

        assert_eq!(original.transactions().len(), 1);
        assert_eq!(original.transactions()[0].receiver, "Bob");
        assert_eq!(original.hash, original.compute_hash());
        assert_ne!(original.hash, fork.hash);
    }

    #[test]
    fn test_genesis_block() {
        let chain = Blockchain::new();
        assert_eq!(chain.len(), 1);
        let genesis = chain.tip();
        assert_eq!(genesis.index(), 0);
        assert_eq!(*genesis.previous_hash(), Digest::ZERO);
        assert_eq!(genesis.timestamp(), GENESIS_TIMESTAMP);
        assert!(genesis.transactions().is_empty());
        assert_eq!(*genesis.merkle_root(), Digest::ZERO);
        assert_eq!(genesis.hash, genesis.compute_hash());
        assert!(!genesis.hash.is_zero());

        // Every fresh chain starts from the same genesis digest.
        assert_eq!(Blockchain::new().tip().hash, genesis.hash);
        assert!(chain.verify_integrity().is_valid());
    }

    #[test]
    fn test_append_block_rejects_bad_index() {
        let mut chain = Blockchain::new();
        let mut block = Block::new(5, chain.tip().hash);
        block.seal();
        assert!(matches!(chain.append_block(block), Err(ChainError::InvalidBlock(_))));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_append_block_rejects_bad_link() {
        let mut chain = Blockchain::new();
        let mut block = Block::new(1, sha256("somewhere else"));
        block.append_transaction("Alice sends 1 DA to Bob").unwrap();
        let err = chain.append_block(block).unwrap_err();
        assert!(matches!(err, ChainError::InvalidBlock(msg) if msg.contains("previous block hash")));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_append_block_rejects_unsealed_block() {
        let mut chain = Blockchain::new();
        let block = Block::new(1, chain.tip().hash);
        let err = chain.append_block(block).unwrap_err();
        assert!(matches!(err, ChainError::InvalidBlock(msg) if msg.contains("not sealed")));

        let mut block = chain.next_block();
        block.append_transaction("Alice sends 1 DA to Bob").unwrap();
        block.transactions[0].amount = 2;
        let err = chain.append_block(block).unwrap_err();
        assert!(matches!(err, ChainError::InvalidBlock(msg) if msg.contains("Merkle")));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_append_block_rejects_oversized_block() {
        let mut chain = Blockchain::new();
        let mut block = chain.next_block();
        for i in 1..=(MAX_TRANSACTIONS_PER_BLOCK as u64 + 5) {
            block
                .transactions
                .push(crate::transaction::Transaction::new("A", "B", i).unwrap());
        }
        block.seal();
        assert_eq!(block.hash, block.compute_hash());

        let err = chain.append_block(block).unwrap_err();
        assert_eq!(
            err,
            ChainError::CapacityExceeded {
                capacity: MAX_TRANSACTIONS_PER_BLOCK
            }
        );
        assert_eq!(chain.len(), 1);

        let mut block = chain.next_block();
        for i in 1..=MAX_TRANSACTIONS_PER_BLOCK as u64 {
            block
                .push_transaction(crate::transaction::Transaction::new("A", "B", i).unwrap())
                .unwrap();
        }
        chain.append_block(block).unwrap();
        assert_eq!(chain.tip().transactions().len(), MAX_TRANSACTIONS_PER_BLOCK);
    }

    #[test]
    fn test_genesis_contents_are_outside_verification() {
        let mut chain = chain_with_blocks(2);
        chain.block_mut(0).unwrap().transactions[0].amount = 5_000;
        assert!(chain.verify_integrity().is_valid());

        chain.block_mut(0).unwrap().seal();
        assert_eq!(
            chain.verify_integrity(),
            Verification::Invalid {
                index: 1,
                violation: Violation::ChainBroken
            }
        );
    }

    #[test]
    fn test_open_block_requires_transactions() {
        let mut chain = Blockchain::new();
        assert!(matches!(chain.open_block(), Err(ChainError::InvalidBlock(_))));

        chain.append_transaction("Alice sends 1 DA to Bob").unwrap();
        assert_eq!(chain.open_block().unwrap(), 1);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.tip().previous_hash(), &chain.blocks()[0].hash);
        assert!(chain.verify_integrity().is_valid());
    }

    #[test]
    fn test_appending_to_tip_keeps_chain_valid() {
        let mut chain = chain_with_blocks(3);
        chain.append_transaction("Eve sends 25 DA to Frank").unwrap();
        assert!(chain.verify_integrity().is_valid());
    }

    #[test]
    fn test_fresh_chains_verify() {
        for n in 1..=6 {
            assert_eq!(chain_with_blocks(n).verify_integrity(), Verification::Valid);
        }
    }

    #[test]
    fn test_tampered_transaction_detected() {
        let mut chain = chain_with_blocks(4);
        chain.block_mut(2).unwrap().transactions[0].amount *= 2;
        assert_eq!(
            chain.verify_integrity(),
            Verification::Invalid {
                index: 2,
                violation: Violation::MerkleMismatch
            }
        );
    }

    #[test]
    fn test_broken_link_detected() {
        let mut chain = chain_with_blocks(4);
        chain.block_mut(3).unwrap().header.previous_hash = sha256("forged");
        assert_eq!(
            chain.verify_integrity(),
            Verification::Invalid {
                index: 3,
                violation: Violation::ChainBroken
            }
        );
    }

    #[test]
    fn test_tampered_header_detected() {
        let mut chain = chain_with_blocks(3);
        chain.block_mut(1).unwrap().header.timestamp += 1;
        assert_eq!(
            chain.verify_integrity(),
            Verification::Invalid {
                index: 1,
                violation: Violation::HashMismatch
            }
        );
    }

    #[test]
    fn test_resealed_tamper_breaks_successor_link() {
        let mut chain = chain_with_blocks(3);
        let block = chain.block_mut(1).unwrap();
        block.transactions[0].amount += 1;
        block.seal();
        assert_eq!(
            chain.verify_integrity(),
            Verification::Invalid {
                index: 2,
                violation: Violation::ChainBroken
            }
        );
    }

    #[test]
    fn test_verification_reports_first_violation_only() {
        let mut chain = chain_with_blocks(4);
        chain.block_mut(3).unwrap().transactions[0].amount += 1;
        chain.block_mut(1).unwrap().transactions[0].amount += 1;
        assert_eq!(
            chain.verify_integrity(),
            Verification::Invalid {
                index: 1,
                violation: Violation::MerkleMismatch
            }
        );
    }

    #[test]
    fn test_verification_does_not_mutate() {
        let mut chain = chain_with_blocks(3);
        chain.block_mut(1).unwrap().transactions[0].amount += 1;
        let snapshot = chain.clone();
        let _ = chain.verify_integrity();
        assert_eq!(chain, snapshot);
        assert_eq!(chain.blocks()[1].merkle_root(), snapshot.blocks()[1].merkle_root());
    }

    #[test]
    fn test_into_result() {
        assert!(Verification::Valid.into_result().is_ok());
        let err = Verification::Invalid {
            index: 2,
            violation: Violation::HashMismatch,
        }
        .into_result()
        .unwrap_err();
        assert_eq!(
            err,
            ChainError::IntegrityViolation {
                index: 2,
                violation: Violation::HashMismatch
            }
        );
    }

    #[test]
    fn test_fingerprint() {
        let chain = chain_with_blocks(3);
        let joined: String = chain.blocks().iter().map(|b| b.hash.to_hex()).collect();
        assert_eq!(chain.fingerprint(), sha256(joined));
        assert_eq!(chain.fingerprint(), chain.clone().fingerprint());

        let mut longer = chain.clone();
        longer.open_block().unwrap();
        assert_ne!(longer.fingerprint(), chain.fingerprint());
    }

    #[test]
    fn test_stats() {
        let chain = chain_with_blocks(3);
        let stats = chain.stats();
        assert_eq!(stats.blocks, 3);
        assert_eq!(stats.transactions, 5);
        assert_eq!(chain.transaction_count(), 5);
        // 50 + (10 + 5) + (20 + 5)
        assert_eq!(stats.total_value, 90);
    }
}
