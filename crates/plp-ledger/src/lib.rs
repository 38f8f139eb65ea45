//! Balance ledger for the Peer Lending Pool (PLP).
//!
//! The ledger is the leaf component of the pool: a mapping from
//! [`plp_types::AccountId`] to a tracked balance in the pool's base unit.
//! It provides:
//! - `LedgerWriter`-style [`LedgerWrite`] / [`LedgerRead`] trait boundaries
//! - [`InMemoryLedger`] implementation for tests and embedding
//! - Overflow/underflow-safe credit and debit
//!
//! Balances are unsigned and therefore non-negative by construction; an
//! account that has never been credited reads as zero and is never
//! destroyed.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use traits::{LedgerRead, LedgerWrite};
