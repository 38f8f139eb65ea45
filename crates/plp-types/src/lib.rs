//! Foundation types for the Peer Lending Pool (PLP).
//!
//! This crate provides the identity and temporal types used throughout the
//! PLP system. Every other PLP crate depends on `plp-types`.
//!
//! # Key Types
//!
//! - [`AccountId`] — Authenticated account identity derived from registration material
//! - [`Timestamp`] — Wall-clock/sequence timestamp used for loan maturities and event ordering

pub mod error;
pub mod identity;
pub mod temporal;

pub use error::TypeError;
pub use identity::{AccountId, AccountMaterial};
pub use temporal::Timestamp;
