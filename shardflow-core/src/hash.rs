//! Keccak-256 content hashes
//!
//! Provides:
//! - `H256`, the 32-byte hash used for chunk leaves and Merkle nodes
//! - The canonical hash of an all-zero chunk, used for padding positions

use crate::error::{Result, ShardflowError};
use crate::CHUNK_SIZE;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::sync::LazyLock;

/// Hash length in bytes
pub const HASH_SIZE: usize = 32;

/// Hash of a chunk made entirely of zero bytes
pub static EMPTY_CHUNK_HASH: LazyLock<H256> = LazyLock::new(|| keccak256(&[0u8; CHUNK_SIZE]));

/// Keccak-256 hash wrapper
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct H256([u8; HASH_SIZE]);

impl H256 {
    /// The all-zero hash, returned for trees without leaves
    pub const fn zero() -> Self {
        Self([0u8; HASH_SIZE])
    }

    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw hash bytes
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_SIZE]
    }

    /// Convert to `0x`-prefixed hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex string, with or without `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(digits).map_err(|e| ShardflowError::InvalidHash(e.to_string()))?;

        if bytes.len() != HASH_SIZE {
            return Err(ShardflowError::InvalidHash(format!(
                "Invalid length: expected {}, got {}",
                HASH_SIZE,
                bytes.len()
            )));
        }

        let mut arr = [0u8; HASH_SIZE];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

/// Compute the Keccak-256 hash of data
pub fn keccak256(data: &[u8]) -> H256 {
    H256(Keccak256::digest(data).into())
}

/// Hash two child nodes into their parent
pub fn keccak256_pair(left: &H256, right: &H256) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(left.0);
    hasher.update(right.0);
    H256(hasher.finalize().into())
}

impl fmt::Debug for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H256({})", &self.to_hex()[..18])
    }
}

impl fmt::Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for H256 {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for H256 {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        H256::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_known_vector() {
        // Keccak-256 of the empty string
        assert_eq!(
            keccak256(b"").to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_empty_chunk_hash() {
        assert_eq!(*EMPTY_CHUNK_HASH, keccak256(&vec![0u8; CHUNK_SIZE]));
        assert!(!EMPTY_CHUNK_HASH.is_zero());
    }

    #[test]
    fn test_hex_roundtrip() {
        let hash = keccak256(b"shardflow");
        let parsed = H256::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, parsed);

        let unprefixed = H256::from_hex(&hex::encode(hash.as_bytes())).unwrap();
        assert_eq!(hash, unprefixed);
    }

    #[test]
    fn test_from_hex_rejects_bad_length() {
        let result = H256::from_hex("0xdeadbeef");
        assert!(matches!(result, Err(ShardflowError::InvalidHash(_))));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let hash = keccak256(b"abc");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));
        let back: H256 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn test_pair_is_order_sensitive() {
        let a = keccak256(b"a");
        let b = keccak256(b"b");
        assert_ne!(keccak256_pair(&a, &b), keccak256_pair(&b, &a));
    }
}
