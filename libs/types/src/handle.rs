//! Opaque ciphertext handles and proofs
//!
//! A handle is a fixed-width bag of bits standing in for a ciphertext held by
//! the crypto backend. The ledger never interprets it numerically: equality
//! is bitwise and the only distinguished value is the all-zero
//! [`EncryptedHandle::NULL`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Width of a handle in bytes
pub const HANDLE_LEN: usize = 32;

/// Errors parsing a handle from its hex wire form
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandleError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid handle length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Opaque reference to an encrypted value
///
/// Immutable. Composition always produces a new handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncryptedHandle([u8; HANDLE_LEN]);

impl EncryptedHandle {
    /// "No value / uninitialized". Identity for addition, zero for multiplication.
    pub const NULL: Self = Self([0u8; HANDLE_LEN]);

    pub const fn from_bytes(bytes: [u8; HANDLE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HANDLE_LEN] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; HANDLE_LEN]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, HandleError> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| HandleError::InvalidHex(e.to_string()))?;
        let actual = bytes.len();
        let bytes: [u8; HANDLE_LEN] = bytes.try_into().map_err(|_| HandleError::InvalidLength {
            expected: HANDLE_LEN,
            actual,
        })?;
        Ok(Self(bytes))
    }
}

impl Default for EncryptedHandle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for EncryptedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "EncryptedHandle(null)");
        }
        write!(f, "EncryptedHandle({}..)", hex::encode(&self.0[..6]))
    }
}

impl fmt::Display for EncryptedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<[u8; HANDLE_LEN]> for EncryptedHandle {
    fn from(bytes: [u8; HANDLE_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for EncryptedHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EncryptedHandle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Opaque proof bytes accompanying a handle when it enters the ledger
///
/// Only meaningful to the proof backend. Debug output shows the length only.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Proof(Vec<u8>);

impl Proof {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Proof({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for Proof {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Proof {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Serialize for Proof {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Proof {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x"))
            .map(Proof)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handle_is_default() {
        assert!(EncryptedHandle::default().is_null());
        assert_eq!(EncryptedHandle::default(), EncryptedHandle::NULL);
    }

    #[test]
    fn test_non_null_handle() {
        let mut bytes = [0u8; HANDLE_LEN];
        bytes[31] = 1;
        assert!(!EncryptedHandle::from_bytes(bytes).is_null());
    }

    #[test]
    fn test_handle_hex_parse() {
        let h = EncryptedHandle::from_bytes([0xab; HANDLE_LEN]);
        assert_eq!(EncryptedHandle::from_hex(&h.to_string()).unwrap(), h);
    }

    #[test]
    fn test_handle_wrong_length() {
        let result = EncryptedHandle::from_hex("abcd");
        assert_eq!(
            result,
            Err(HandleError::InvalidLength {
                expected: HANDLE_LEN,
                actual: 2
            })
        );
    }

    #[test]
    fn test_handle_serializes_as_hex_string() {
        let h = EncryptedHandle::from_bytes([0x01; HANDLE_LEN]);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(HANDLE_LEN)));
    }

    #[test]
    fn test_proof_debug_hides_bytes() {
        let proof = Proof::new(vec![1, 2, 3]);
        assert_eq!(format!("{:?}", proof), "Proof(3 bytes)");
        assert!(Proof::empty().is_empty());
    }

    mod fuzz {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn fuzz_wrong_length_rejected(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
                prop_assume!(bytes.len() != HANDLE_LEN);
                let result = EncryptedHandle::from_hex(&hex::encode(&bytes));
                prop_assert_eq!(
                    result,
                    Err(HandleError::InvalidLength { expected: HANDLE_LEN, actual: bytes.len() })
                );
            }

            #[test]
            fn fuzz_only_all_zero_is_null(bytes in prop::array::uniform32(any::<u8>())) {
                let h = EncryptedHandle::from_bytes(bytes);
                prop_assert_eq!(h.is_null(), bytes.iter().all(|b| *b == 0));
            }
        }
    }
}
