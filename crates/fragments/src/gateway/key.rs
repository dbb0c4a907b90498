//! Filesystem-safe keys for owners and fragment ids.
//!
//! Owner ids and fragment ids are opaque strings of any length (nothing stops a
//! caller from passing `../etc` or a 4 KiB id), so neither is used as a path
//! component directly. Both are hashed with BLAKE3: an [`OwnerKey`] keeps 128
//! bits (32 hex chars), an [`IdKey`] the full 256 bits (64 hex chars). Keys
//! are one-way; listings recover ids from the stored records.

use std::str::FromStr;

use thiserror::Error;

/// Errors parsing a key read back from disk.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid key length: expected {expected} hex chars, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid hex character in key")]
    InvalidHex,
}

/// Directory name for an owner: 128 bits of BLAKE3, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerKey(String);

impl OwnerKey {
    pub fn from_owner(owner_id: &str) -> Self {
        let digest = blake3::hash(owner_id.as_bytes());
        Self(hex::encode(&digest.as_bytes()[..16]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// File name for a fragment id: 256 bits of BLAKE3, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdKey(String);

impl IdKey {
    /// Hex length of every id key.
    pub const LEN: usize = 64;

    pub fn from_id(id: &str) -> Self {
        Self(blake3::hash(id.as_bytes()).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for IdKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::LEN {
            return Err(KeyError::InvalidLength {
                expected: Self::LEN,
                actual: s.len(),
            });
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(KeyError::InvalidHex);
        }
        Ok(Self(s.to_lowercase()))
    }
}
