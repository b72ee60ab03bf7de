//! Hashing primitives for the ledger

use crate::error::ChainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of a digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Length of a digest rendered as lowercase hex.
pub const DIGEST_HEX_LEN: usize = DIGEST_LEN * 2;

/// A SHA-256 digest.
///
/// Everything that feeds another hash (Merkle parents, block preimages, chain
/// fingerprints) uses the 64-character lowercase hex rendering, never the raw
/// bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// All-zero sentinel: the Merkle root of an empty block and the
    /// predecessor of every genesis block.
    pub const ZERO: Digest = Digest([0u8; DIGEST_LEN]);

    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Digest(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, ChainError> {
        if hex_str.len() != DIGEST_HEX_LEN {
            return Err(ChainError::InvalidDigest(format!(
                "Digest must be {} hex characters, got {}",
                DIGEST_HEX_LEN,
                hex_str.len()
            )));
        }
        let bytes = hex::decode(hex_str)
            .map_err(|e| ChainError::InvalidDigest(format!("Invalid hex digest: {}", e)))?;
        bytes
            .try_into()
            .map(Digest)
            .map_err(|_| ChainError::InvalidDigest("Failed to convert bytes into digest".to_string()))
    }

    pub fn is_zero(&self) -> bool {
        *self == Digest::ZERO
    }

    /// First `n` hex characters, for compact display.
    pub fn short(&self, n: usize) -> String {
        let mut s = self.to_hex();
        s.truncate(n.min(DIGEST_HEX_LEN));
        s
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Digest::from_hex(s)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Hash arbitrary bytes with SHA-256.
pub fn sha256(data: impl AsRef<[u8]>) -> Digest {
    Digest(Sha256::digest(data.as_ref()).into())
}

/// Hash the concatenation of several byte strings without building the
/// joined buffer first.
pub fn sha256_concat<I, T>(parts: I) -> Digest
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref());
    }
    Digest(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_digest() {
        assert_eq!(
            sha256(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(
            sha256("abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hex_is_lowercase_and_fixed_length() {
        let hex = sha256("Alice sends 50 DA to Bob").to_hex();
        assert_eq!(hex.len(), DIGEST_HEX_LEN);
        assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_concat_matches_joined_input() {
        assert_eq!(sha256_concat(["ab", "c"]), sha256("abc"));
    }

    #[test]
    fn test_zero_sentinel() {
        assert_eq!(Digest::ZERO.to_hex(), "0".repeat(64));
        assert!(Digest::ZERO.is_zero());
        assert!(!sha256("x").is_zero());
    }

    #[test]
    fn test_from_hex_roundtrip_and_errors() {
        let d = sha256("ledger");
        assert_eq!(Digest::from_hex(&d.to_hex()).unwrap(), d);
        assert!(matches!(Digest::from_hex("abcd"), Err(ChainError::InvalidDigest(_))));
        assert!(matches!(
            Digest::from_hex(&"zz".repeat(32)),
            Err(ChainError::InvalidDigest(_))
        ));
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let d = sha256("abc");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{}\"", d.to_hex()));
        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
