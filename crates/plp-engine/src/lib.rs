//! Accounting engine for the Peer Lending Pool (PLP).
//!
//! This crate is the heart of PLP. It composes the balance ledger, the
//! append-only loan book, and the notification bus into the four pool
//! operations:
//! - `deposit` — credit the caller's tracked balance
//! - `withdraw` — debit first, then transfer out; roll back if the
//!   transfer fails
//! - `request_loan` — record an open loan and hand back its stable index
//! - `repay_loan` — settle a loan from the borrower's tracked balance
//!
//! Every operation either commits fully or reports a typed failure with
//! zero state change. Successful operations emit exactly one event;
//! failed or rolled-back ones emit nothing.
//!
//! The crate also provides deterministic [`replay`] of the event journal
//! and a conservation [`audit`] over journal and stores.

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod replay;
pub mod transfer;

pub use audit::{AuditReport, ConservationAuditor, Violation, ViolationKind};
pub use config::EngineConfig;
pub use engine::AccountingEngine;
pub use error::EngineError;
pub use replay::{ReplayEngine, ReplayedState};
pub use transfer::{AcceptingTransfer, ValueTransfer};
