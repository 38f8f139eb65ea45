use std::sync::RwLock;

use tracing::debug;

use plp_types::{AccountId, Timestamp};

use crate::error::LoanBookError;
use crate::loan::{Loan, LoanTerms};
use crate::traits::{LoanBookRead, LoanBookWrite};

/// In-memory loan book for tests, local demos, and embedding.
#[derive(Debug)]
pub struct InMemoryLoanBook {
    loans: RwLock<Vec<Loan>>,
}

impl InMemoryLoanBook {
    pub fn new() -> Self {
        Self {
            loans: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryLoanBook {
    fn default() -> Self {
        Self::new()
    }
}

impl LoanBookWrite for InMemoryLoanBook {
    fn append(
        &self,
        borrower: &AccountId,
        terms: LoanTerms,
        now: Timestamp,
    ) -> Result<u64, LoanBookError> {
        terms.validate()?;
        let maturity = now
            .after_secs(terms.duration_secs)
            .ok_or(LoanBookError::Overflow)?;

        let mut loans = self
            .loans
            .write()
            .map_err(|_| LoanBookError::Store("loan book write lock poisoned".into()))?;

        let index = loans.len() as u64;
        loans.push(Loan {
            borrower: borrower.clone(),
            terms,
            maturity,
            repaid: false,
        });

        debug!(
            index,
            borrower = %borrower,
            principal = terms.principal,
            rate = terms.rate,
            maturity = %maturity,
            "loan recorded"
        );
        Ok(index)
    }

    fn mark_repaid(&self, index: u64) -> Result<(), LoanBookError> {
        let mut loans = self
            .loans
            .write()
            .map_err(|_| LoanBookError::Store("loan book write lock poisoned".into()))?;

        let loan = loans
            .get_mut(index as usize)
            .ok_or(LoanBookError::LoanNotFound { index })?;
        if loan.repaid {
            return Err(LoanBookError::AlreadyRepaid { index });
        }
        loan.repaid = true;

        debug!(index, "loan marked repaid");
        Ok(())
    }
}

impl LoanBookRead for InMemoryLoanBook {
    fn get(&self, index: u64) -> Result<Loan, LoanBookError> {
        let loans = self
            .loans
            .read()
            .map_err(|_| LoanBookError::Store("loan book read lock poisoned".into()))?;

        loans
            .get(index as usize)
            .cloned()
            .ok_or(LoanBookError::LoanNotFound { index })
    }

    fn loan_count(&self) -> Result<u64, LoanBookError> {
        let loans = self
            .loans
            .read()
            .map_err(|_| LoanBookError::Store("loan book read lock poisoned".into()))?;

        Ok(loans.len() as u64)
    }

    fn loans(&self) -> Result<Vec<Loan>, LoanBookError> {
        let loans = self
            .loans
            .read()
            .map_err(|_| LoanBookError::Store("loan book read lock poisoned".into()))?;

        Ok(loans.clone())
    }

    fn open_loans_of(&self, borrower: &AccountId) -> Result<Vec<(u64, Loan)>, LoanBookError> {
        let loans = self
            .loans
            .read()
            .map_err(|_| LoanBookError::Store("loan book read lock poisoned".into()))?;

        Ok(loans
            .iter()
            .enumerate()
            .filter(|(_, loan)| !loan.repaid && loan.borrower == *borrower)
            .map(|(index, loan)| (index as u64, loan.clone()))
            .collect())
    }
}
