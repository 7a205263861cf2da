//! Encrypted-value engine
//!
//! Bookkeeping layer around an external homomorphic crypto backend. The
//! engine composes opaque handles (add, subtract, multiply, compare, sums)
//! and gates every handle that enters the ledger behind proof verification.
//! It never sees plaintext beyond what a caller hands to `encrypt`.
//!
//! # Modules
//! - `context`: Caller/time binding for fresh ciphertexts
//! - `backend`: Proof backend trait and the digest-based reference backend
//! - `engine`: Handle composition and verification gate

pub mod context;
pub mod backend;
pub mod engine;

pub use backend::{DigestProofBackend, ProofBackend, RANGE_BOUND_LEN};
pub use context::EncryptionContext;
pub use engine::CipherEngine;
