//! Types library for the confidential ledger
//!
//! Core type definitions shared by the encrypted-value engine and the
//! contract layer: identifiers, opaque ciphertext handles, proofs and the
//! error taxonomy every component maps its failures onto.
//!
//! # Modules
//! - `ids`: Identifiers (AccountId, AssetId, VaultId, PoolId, OrderId, SwapId)
//! - `handle`: Opaque encrypted handles and proofs
//! - `order`: Order side and kind
//! - `errors`: Error kind taxonomy

pub mod ids;
pub mod handle;
pub mod order;
pub mod errors;
