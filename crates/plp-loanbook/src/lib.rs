//! Append-only loan book for the Peer Lending Pool (PLP).
//!
//! The book is the authoritative record of every loan the pool has seen.
//! It provides:
//! - The [`Loan`] record and [`LoanTerms`] input struct
//! - [`LoanBookRead`] / [`LoanBookWrite`] trait boundaries
//! - [`InMemoryLoanBook`] implementation for tests and embedding
//!
//! Loans are addressed by their position in the book: a stable, 0-based
//! index assigned at append time. The book is append-only: an index once
//! assigned never refers to a different loan, and no loan is ever deleted.

pub mod error;
pub mod loan;
pub mod memory;
pub mod traits;

pub use error::LoanBookError;
pub use loan::{Loan, LoanStatus, LoanTerms};
pub use memory::InMemoryLoanBook;
pub use traits::{LoanBookRead, LoanBookWrite};
