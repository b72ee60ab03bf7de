//! Transaction types for the ledger
use crate::crypto::{sha256, Digest};
use crate::error::ChainError;
use std::fmt;

/// Upper bound on sender/receiver identifier length, in characters.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// A transfer of `amount` DA from `sender` to `receiver`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: u64,
}

impl Transaction {
    /// Build a transaction from its parts, enforcing the same bounds the
    /// parser enforces.
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: u64,
    ) -> Result<Self, ChainError> {
        let tx = Transaction {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        };
        tx.validate()?;
        Ok(tx)
    }

    /// Canonical encoding: `"<sender> sends <amount> DA to <receiver>"`.
    ///
    /// This is the Merkle leaf preimage; changing it changes every digest.
    pub fn to_canonical_string(&self) -> String {
        format!("{} sends {} DA to {}", self.sender, self.amount, self.receiver)
    }

    /// Leaf digest of this transaction.
    pub fn hash(&self) -> Digest {
        sha256(self.to_canonical_string())
    }

    pub fn hash_str(&self) -> String {
        self.hash().to_hex()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}
