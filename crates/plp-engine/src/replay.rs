use plp_events::{EventPayload, PoolEvent};
use plp_ledger::{InMemoryLedger, LedgerRead, LedgerWrite};
use plp_loanbook::{InMemoryLoanBook, LoanBookRead, LoanBookWrite, LoanTerms};
use plp_types::Timestamp;

use crate::error::EngineError;

/// Stores rebuilt from an event journal.
#[derive(Default, Debug)]
pub struct ReplayedState {
    pub ledger: InMemoryLedger,
    pub loans: InMemoryLoanBook,
    pub applied_events: u64,
}

/// Deterministic replay of a pool event journal.
///
/// The journal records exactly one event per successful operation, so
/// replaying it in order reconstructs the ledger and loan book the
/// operations produced. Every event's integrity hash is verified before it
/// is applied; a tampered or internally inconsistent journal fails with
/// `IntegrityViolation` rather than producing a silently wrong state.
pub struct ReplayEngine;

impl ReplayEngine {
    /// Rebuild ledger and loan book from a journal.
    pub fn rebuild(events: &[PoolEvent]) -> Result<ReplayedState, EngineError> {
        let ledger = InMemoryLedger::default();
        let loans = InMemoryLoanBook::default();

        for (position, event) in events.iter().enumerate() {
            let position = position as u64;
            if !event.verify_integrity() {
                return Err(EngineError::IntegrityViolation {
                    index: position,
                    reason: "integrity hash mismatch".into(),
                });
            }

            match &event.payload {
                EventPayload::Deposited { account, amount } => {
                    ledger.credit(account, *amount)?;
                }
                EventPayload::Withdrawn { account, amount } => {
                    ledger.debit(account, *amount)?;
                }
                EventPayload::LoanRequested {
                    index,
                    borrower,
                    principal,
                    rate,
                    duration_secs,
                    maturity,
                } => {
                    // The journal records maturity, not creation time;
                    // maturity = creation + duration pins creation exactly.
                    let created_secs = maturity.secs.checked_sub(*duration_secs).ok_or_else(|| {
                        EngineError::IntegrityViolation {
                            index: position,
                            reason: "maturity precedes loan duration".into(),
                        }
                    })?;
                    let assigned = loans.append(
                        borrower,
                        LoanTerms::new(*principal, *rate, *duration_secs),
                        Timestamp::new(created_secs, 0),
                    )?;
                    if assigned != *index {
                        return Err(EngineError::IntegrityViolation {
                            index: position,
                            reason: format!(
                                "loan index mismatch: recorded {index}, rebuilt {assigned}"
                            ),
                        });
                    }
                }
                EventPayload::LoanRepaid { index, total } => {
                    let loan = loans.get(*index)?;
                    let due = loan.total_due()?;
                    if due != *total {
                        return Err(EngineError::IntegrityViolation {
                            index: position,
                            reason: format!(
                                "settlement total mismatch: recorded {total}, computed {due}"
                            ),
                        });
                    }
                    ledger.debit(&loan.borrower, *total)?;
                    loans.mark_repaid(*index)?;
                }
            }
        }

        Ok(ReplayedState {
            ledger,
            loans,
            applied_events: events.len() as u64,
        })
    }

    /// Returns `true` if replaying the journal reproduces the live stores.
    pub fn verify_convergence<L, B>(
        events: &[PoolEvent],
        ledger: &L,
        loans: &B,
    ) -> Result<bool, EngineError>
    where
        L: LedgerRead,
        B: LoanBookRead,
    {
        let rebuilt = Self::rebuild(events)?;

        let accounts = ledger.accounts()?;
        if rebuilt.ledger.accounts()? != accounts {
            return Ok(false);
        }
        for account in &accounts {
            if rebuilt.ledger.balance_of(account)? != ledger.balance_of(account)? {
                return Ok(false);
            }
        }

        Ok(rebuilt.loans.loans()? == loans.loans()?)
    }
}
