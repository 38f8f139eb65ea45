use plp_types::{AccountId, Timestamp};

use crate::error::LoanBookError;
use crate::loan::{Loan, LoanTerms};

/// Write boundary for loan book mutation.
pub trait LoanBookWrite: Send + Sync {
    /// Record a new open loan and return its stable index.
    fn append(
        &self,
        borrower: &AccountId,
        terms: LoanTerms,
        now: Timestamp,
    ) -> Result<u64, LoanBookError>;

    /// Flip the loan's repaid flag. A second call for the same index is
    /// rejected with `AlreadyRepaid`, never silently accepted.
    fn mark_repaid(&self, index: u64) -> Result<(), LoanBookError>;
}

/// Read boundary for loan book queries.
pub trait LoanBookRead: Send + Sync {
    /// The loan at `index`, if the index has been assigned.
    fn get(&self, index: u64) -> Result<Loan, LoanBookError>;

    /// Number of loans ever recorded.
    fn loan_count(&self) -> Result<u64, LoanBookError>;

    /// Snapshot of every loan, in index order.
    fn loans(&self) -> Result<Vec<Loan>, LoanBookError>;

    /// Indices and records of the borrower's open loans.
    fn open_loans_of(&self, borrower: &AccountId) -> Result<Vec<(u64, Loan)>, LoanBookError>;
}
