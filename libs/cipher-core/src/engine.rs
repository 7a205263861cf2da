//! Handle composition and verification gate
//!
//! Composition is total: any bit pattern is a syntactically valid handle and
//! no operation here fails. The algebraic shortcuts below are the only facts
//! the ledger can know about ciphertexts without decryption:
//!
//! - `add(x, NULL) == x` and `add(NULL, x) == x`
//! - `subtract(x, NULL) == x`
//! - `subtract(x, x) == NULL`
//! - `multiply(x, NULL) == NULL` and `multiply(NULL, x) == NULL`
//!
//! Everything else derives a fresh opaque handle from the operation tag and
//! the operand bits. Derived handles are not order-invariant:
//! `add(a, b) != add(b, a)` in general.

use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use types::handle::{EncryptedHandle, Proof, HANDLE_LEN};

use crate::backend::{ProofBackend, RANGE_BOUND_LEN};
use crate::context::EncryptionContext;

const HANDLE_DOMAIN: &[u8] = b"confidential-ledger/handle/v1";

/// Opaque-handle arithmetic over an external proof backend
pub struct CipherEngine {
    backend: Arc<dyn ProofBackend>,
    /// Per-engine counter mixed into every fresh ciphertext
    nonce: AtomicU64,
}

impl CipherEngine {
    pub fn new(backend: impl ProofBackend + 'static) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    pub fn with_backend(backend: Arc<dyn ProofBackend>) -> Self {
        Self {
            backend,
            nonce: AtomicU64::new(0),
        }
    }

    // ───────────────────────── Encryption ─────────────────────────

    /// Bind `value` to the caller and time in `context` as a fresh handle.
    ///
    /// Never returns the same handle twice, even for identical inputs.
    pub fn encrypt(&self, value: u64, context: &EncryptionContext) -> EncryptedHandle {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
        derive(
            b"encrypt",
            &[
                &value.to_le_bytes(),
                context.caller.as_bytes(),
                &context.timestamp.to_le_bytes(),
                &nonce.to_le_bytes(),
            ],
        )
    }

    /// Encrypt every value under the same context. Output order matches input.
    pub fn batch_encrypt(&self, values: &[u64], context: &EncryptionContext) -> Vec<EncryptedHandle> {
        values.iter().map(|v| self.encrypt(*v, context)).collect()
    }

    // ───────────────────────── Composition ─────────────────────────

    pub fn add(&self, a: &EncryptedHandle, b: &EncryptedHandle) -> EncryptedHandle {
        if b.is_null() {
            return *a;
        }
        if a.is_null() {
            return *b;
        }
        derive(b"add", &[a.as_bytes(), b.as_bytes()])
    }

    pub fn subtract(&self, a: &EncryptedHandle, b: &EncryptedHandle) -> EncryptedHandle {
        if b.is_null() {
            return *a;
        }
        if a == b {
            return EncryptedHandle::NULL;
        }
        derive(b"sub", &[a.as_bytes(), b.as_bytes()])
    }

    pub fn multiply(&self, a: &EncryptedHandle, b: &EncryptedHandle) -> EncryptedHandle {
        if a.is_null() || b.is_null() {
            return EncryptedHandle::NULL;
        }
        derive(b"mul", &[a.as_bytes(), b.as_bytes()])
    }

    /// Encrypted comparison result. Only a decryption oracle can reveal it.
    pub fn compare(&self, a: &EncryptedHandle, b: &EncryptedHandle) -> EncryptedHandle {
        derive(b"cmp", &[a.as_bytes(), b.as_bytes()])
    }

    /// Left fold over `add`. The empty sum is `NULL`.
    pub fn homomorphic_sum(&self, handles: &[EncryptedHandle]) -> EncryptedHandle {
        handles
            .iter()
            .fold(EncryptedHandle::NULL, |acc, h| self.add(&acc, h))
    }

    /// Placeholder composition of sum and count.
    ///
    /// No homomorphic division exists here: a single element stands in for
    /// itself and larger inputs yield a handle whose relation to the mean is
    /// up to the backend.
    pub fn homomorphic_average(&self, handles: &[EncryptedHandle]) -> EncryptedHandle {
        match handles {
            [] => EncryptedHandle::NULL,
            [single] => *single,
            _ => {
                let sum = self.homomorphic_sum(handles);
                let count = handles.len() as u64;
                derive(b"avg", &[sum.as_bytes(), &count.to_le_bytes()])
            }
        }
    }

    // ───────────────────────── Verification ─────────────────────────

    /// Gate for a handle entering the ledger. Deterministic, no side effects.
    pub fn verify(&self, handle: &EncryptedHandle, proof: &Proof) -> bool {
        if proof.is_empty() {
            debug!("proof rejected: empty");
            return false;
        }
        if handle.is_null() {
            debug!("proof rejected: null handle");
            return false;
        }
        self.backend.verify(handle, proof)
    }

    /// Gate for a handle whose plaintext must lie in `[min, max)`.
    pub fn verify_range(&self, handle: &EncryptedHandle, min: u64, max: u64, proof: &Proof) -> bool {
        if min >= max {
            debug!(min, max, "range proof rejected: empty bound");
            return false;
        }
        if proof.len() < RANGE_BOUND_LEN {
            debug!(proof_len = proof.len(), "range proof rejected: too short to embed bound");
            return false;
        }
        self.backend.verify_range(handle, min, max, proof)
    }
}

impl fmt::Debug for CipherEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherEngine")
            .field("nonce", &self.nonce.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Derive an opaque handle from an operation tag and its operands.
///
/// Operands are length-prefixed so distinct operand splits never collide.
fn derive(tag: &[u8], parts: &[&[u8]]) -> EncryptedHandle {
    let mut hasher = Sha256::new();
    hasher.update(HANDLE_DOMAIN);
    hasher.update(tag);
    for part in parts {
        hasher.update((part.len() as u32).to_le_bytes());
        hasher.update(part);
    }
    let mut bytes: [u8; HANDLE_LEN] = hasher.finalize().into();
    // NULL is reserved
    if bytes == [0u8; HANDLE_LEN] {
        bytes[HANDLE_LEN - 1] = 1;
    }
    EncryptedHandle::from_bytes(bytes)
}
