//! Encryption context
//!
//! Binds a fresh ciphertext to who produced it and when, so equal plaintexts
//! encrypted by different callers or at different times stay unlinkable.

use types::ids::AccountId;

/// Caller identity and timestamp a new handle is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionContext {
    pub caller: AccountId,
    pub timestamp: i64,
}

impl EncryptionContext {
    pub fn new(caller: AccountId, timestamp: i64) -> Self {
        Self { caller, timestamp }
    }
}
