use serde::{Deserialize, Serialize};

use plp_types::{AccountId, Timestamp};

use crate::error::LoanBookError;

/// Terms requested for a loan.
///
/// Zero-interest loans are unsupported: every term must be strictly
/// positive, and `validate` is the single place that rule is enforced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Borrowed amount before interest, in the pool's base unit.
    pub principal: u64,
    /// Interest rate as an integer percentage of the principal.
    pub rate: u32,
    /// Requested duration in seconds; maturity = creation time + duration.
    pub duration_secs: u64,
}

impl LoanTerms {
    pub fn new(principal: u64, rate: u32, duration_secs: u64) -> Self {
        Self {
            principal,
            rate,
            duration_secs,
        }
    }

    /// Check the structural validity of these terms.
    pub fn validate(&self) -> Result<(), LoanBookError> {
        if self.principal == 0 {
            return Err(LoanBookError::InvalidLoanTerms {
                reason: "principal must be greater than zero".into(),
            });
        }
        if self.rate == 0 {
            return Err(LoanBookError::InvalidLoanTerms {
                reason: "rate must be greater than zero".into(),
            });
        }
        if self.duration_secs == 0 {
            return Err(LoanBookError::InvalidLoanTerms {
                reason: "duration must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

/// Settlement state of a loan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// Outstanding; the borrower has not settled.
    Open,
    /// Settled; terminal.
    Repaid,
}

/// A single loan record in the book.
///
/// Created open, mutated exactly once (the `repaid` flip at settlement),
/// immutable thereafter. Maturity is recorded for reporting but never
/// enforced as a deadline; there is no Defaulted or Expired state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// The account that requested the loan; the only identity allowed to
    /// settle it.
    pub borrower: AccountId,
    /// The terms the loan was recorded with.
    pub terms: LoanTerms,
    /// Recorded due time = creation time + duration. Advisory only.
    pub maturity: Timestamp,
    /// Whether the loan has been settled.
    pub repaid: bool,
}

impl Loan {
    /// The settlement state as a typed view over the `repaid` flag.
    pub fn status(&self) -> LoanStatus {
        if self.repaid {
            LoanStatus::Repaid
        } else {
            LoanStatus::Open
        }
    }

    /// The total owed at settlement: principal + principal * rate / 100,
    /// in checked integer (floor) arithmetic.
    pub fn total_due(&self) -> Result<u64, LoanBookError> {
        let interest = self
            .terms
            .principal
            .checked_mul(u64::from(self.terms.rate))
            .ok_or(LoanBookError::Overflow)?
            / 100;
        self.terms
            .principal
            .checked_add(interest)
            .ok_or(LoanBookError::Overflow)
    }
}
