//! Confidential Campaign Ledger & Exchange Contracts
//!
//! State machines built on top of the encrypted-value engine. No component
//! here ever sees a plaintext amount except the public transfer total a
//! campaign uses for its completion check.
//!
//! # Modules
//! - `config`: Bounds for campaigns and the exchange, loadable from JSON
//! - `errors`: Per-component error types, each mapping to an `ErrorKind`
//! - `events`: Contract events, journal records and event sinks
//! - `security`: Reentrancy guard and role-based access control
//! - `clock`: Time source abstraction (system and manual clocks)
//! - `lifecycle`: Campaign status transition table
//! - `campaign`: Funding vaults with encrypted contribution accounting
//! - `exchange`: Liquidity pools, order book and swaps over encrypted values
//! - `registry`: Campaign metadata, verification tiers and counters
//! - `ledger`: Thread-safe facade serializing all mutating calls

pub mod campaign;
pub mod clock;
pub mod config;
pub mod errors;
pub mod events;
pub mod exchange;
pub mod ledger;
pub mod lifecycle;
pub mod registry;
pub mod security;

pub use ledger::ConfidentialLedger;

/// Contract ABI version, frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";
