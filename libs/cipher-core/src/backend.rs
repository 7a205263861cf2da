//! Proof backend
//!
//! The engine delegates the cryptographic half of verification to a
//! [`ProofBackend`]. Real deployments plug in their ZK verifier here; the
//! crate ships [`DigestProofBackend`], a SHA-256 stand-in where a proof is a
//! digest over the handle (and bound) it was produced for.

use sha2::{Digest, Sha256};
use types::handle::{EncryptedHandle, Proof};

/// Bytes a range proof must reserve for its embedded `min` and `max` bound
pub const RANGE_BOUND_LEN: usize = 16;

const PROOF_DOMAIN: &[u8] = b"confidential-ledger/proof/v1";
const RANGE_DOMAIN: &[u8] = b"confidential-ledger/range/v1";

/// External verifier contract
///
/// Implementations must be deterministic for identical inputs and free of
/// side effects.
pub trait ProofBackend: Send + Sync {
    /// Check that `proof` was produced for `handle`.
    fn verify(&self, handle: &EncryptedHandle, proof: &Proof) -> bool;

    /// Check that `proof` shows the plaintext behind `handle` lies in `[min, max)`.
    fn verify_range(&self, handle: &EncryptedHandle, min: u64, max: u64, proof: &Proof) -> bool;
}

/// Digest-based reference backend
///
/// Proof layout:
/// - input proof: `SHA256(domain || handle)`
/// - range proof: `min_le || max_le || SHA256(domain || handle || min_le || max_le)`
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestProofBackend;

impl DigestProofBackend {
    pub fn new() -> Self {
        Self
    }

    /// Produce the proof this backend accepts for `handle`.
    pub fn prove(handle: &EncryptedHandle) -> Proof {
        Proof::new(input_digest(handle).to_vec())
    }

    /// Produce the range proof this backend accepts for `handle` in `[min, max)`.
    pub fn prove_range(handle: &EncryptedHandle, min: u64, max: u64) -> Proof {
        let mut bytes = Vec::with_capacity(RANGE_BOUND_LEN + 32);
        bytes.extend_from_slice(&min.to_le_bytes());
        bytes.extend_from_slice(&max.to_le_bytes());
        bytes.extend_from_slice(&range_digest(handle, min, max));
        Proof::new(bytes)
    }
}

impl ProofBackend for DigestProofBackend {
    fn verify(&self, handle: &EncryptedHandle, proof: &Proof) -> bool {
        proof.as_bytes() == input_digest(handle).as_slice()
    }

    fn verify_range(&self, handle: &EncryptedHandle, min: u64, max: u64, proof: &Proof) -> bool {
        let bytes = proof.as_bytes();
        if bytes.len() != RANGE_BOUND_LEN + 32 {
            return false;
        }
        let (bound, digest) = bytes.split_at(RANGE_BOUND_LEN);
        let (embedded_min, embedded_max) = bound.split_at(8);
        embedded_min == min.to_le_bytes().as_slice()
            && embedded_max == max.to_le_bytes().as_slice()
            && digest == range_digest(handle, min, max).as_slice()
    }
}

fn input_digest(handle: &EncryptedHandle) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(PROOF_DOMAIN);
    hasher.update(handle.as_bytes());
    hasher.finalize().into()
}

fn range_digest(handle: &EncryptedHandle, min: u64, max: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(RANGE_DOMAIN);
    hasher.update(handle.as_bytes());
    hasher.update(min.to_le_bytes());
    hasher.update(max.to_le_bytes());
    hasher.finalize().into()
}
