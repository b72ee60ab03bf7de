//! Merkle tree over the canonical encodings of a block's transactions.
//!
//! Leaves are `H(canonical(tx))` in block order. Each parent is
//! `H(left_hex ‖ right_hex)`, hashing the hex text of the two children rather
//! than their raw bytes. Whenever a level has an odd number of nodes the last
//! one is paired with a copy of itself, at the leaf level and at every level
//! above it. The empty sequence has the reserved root [`Digest::ZERO`].
//!
//! Trees are built bottom-up into a strict ownership hierarchy: a padding
//! copy is a fresh node carrying the same digest, never a second reference to
//! an existing node.

use crate::crypto::{sha256, sha256_concat, Digest};
use crate::transaction::Transaction;

/// A node of a Merkle tree. Leaves have no children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleNode {
    pub digest: Digest,
    pub left: Option<Box<MerkleNode>>,
    pub right: Option<Box<MerkleNode>>,
}

impl MerkleNode {
    pub fn leaf(digest: Digest) -> Self {
        MerkleNode {
            digest,
            left: None,
            right: None,
        }
    }

    /// Combine two children into their parent.
    pub fn parent(left: MerkleNode, right: MerkleNode) -> Self {
        let digest = hash_pair(&left.digest, &right.digest);
        MerkleNode {
            digest,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    /// A childless stand-in with this node's digest, used to pad odd levels.
    fn duplicate(&self) -> Self {
        MerkleNode::leaf(self.digest)
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Parent digest of two children: `H(left_hex ‖ right_hex)`.
pub fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    sha256_concat([left.to_hex(), right.to_hex()])
}

/// An owned Merkle tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    root: Option<MerkleNode>,
    leaf_count: usize,
    depth: usize,
}

impl MerkleTree {
    /// Build the tree over `transactions` in the given order.
    pub fn build(transactions: &[Transaction]) -> Self {
        let leaves = transactions.iter().map(|tx| sha256(tx.to_canonical_string()));
        Self::from_leaves(leaves)
    }

    /// Build the tree over precomputed leaf digests.
    pub fn from_leaves(leaves: impl IntoIterator<Item = Digest>) -> Self {
        let mut level: Vec<MerkleNode> = leaves.into_iter().map(MerkleNode::leaf).collect();
        let leaf_count = level.len();
        if level.is_empty() {
            return MerkleTree {
                root: None,
                leaf_count: 0,
                depth: 0,
            };
        }

        // A lone leaf is still paired with itself, so the loop runs at least once.
        let mut depth = 0;
        loop {
            if level.len() % 2 == 1 {
                if let Some(last) = level.last() {
                    let pad = last.duplicate();
                    level.push(pad);
                }
            }

            let mut next_level = Vec::with_capacity(level.len() / 2);
            let mut nodes = level.into_iter();
            while let (Some(left), Some(right)) = (nodes.next(), nodes.next()) {
                next_level.push(MerkleNode::parent(left, right));
            }
            depth += 1;
            level = next_level;

            if level.len() == 1 {
                break;
            }
        }

        MerkleTree {
            root: level.pop(),
            leaf_count,
            depth,
        }
    }

    /// Root digest, or [`Digest::ZERO`] for an empty tree.
    pub fn root(&self) -> Digest {
        self.root.as_ref().map_or(Digest::ZERO, |node| node.digest)
    }

    pub fn root_node(&self) -> Option<&MerkleNode> {
        self.root.as_ref()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of hashing levels above the leaves.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

/// Merkle root of `transactions`; the tree itself is dropped afterwards.
pub fn merkle_root(transactions: &[Transaction]) -> Digest {
    MerkleTree::build(transactions).root()
}
