use std::collections::HashSet;

use plp_events::{EventPayload, PoolEvent};
use plp_ledger::LedgerRead;
use plp_loanbook::LoanBookRead;

use crate::error::EngineError;

/// Result of auditing a journal against the live stores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditReport {
    pub event_count: u64,
    pub integrity_valid: bool,
    pub timestamps_monotonic: bool,
    pub conservation_holds: bool,
    pub indices_stable: bool,
    pub settlements_valid: bool,
    pub violations: Vec<Violation>,
}

impl AuditReport {
    /// Returns `true` if all checks passed.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific violation detected during an audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Journal position of the offending event; the journal length for
    /// aggregate violations such as a conservation break.
    pub event_index: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    IntegrityBreak,
    NonMonotonicTimestamp,
    ConservationBreak,
    IndexGap,
    UnknownLoan,
    DoubleSettlement,
    SettlementNotRecorded,
}

/// Journal/store consistency auditor.
///
/// Checks the bookkeeping laws the pool promises: the conservation law
/// (tracked balances equal deposits minus withdrawals minus settlements),
/// stable strictly increasing loan indices, at most one settlement per
/// loan, and an untampered, time-ordered journal.
pub struct ConservationAuditor;

impl ConservationAuditor {
    /// Audit a journal against the stores it should describe.
    pub fn audit<L, B>(
        events: &[PoolEvent],
        ledger: &L,
        book: &B,
    ) -> Result<AuditReport, EngineError>
    where
        L: LedgerRead,
        B: LoanBookRead,
    {
        let mut violations = Vec::new();
        let mut integrity_valid = true;
        let mut timestamps_monotonic = true;
        let mut indices_stable = true;
        let mut settlements_valid = true;

        let mut deposits: i128 = 0;
        let mut withdrawals: i128 = 0;
        let mut settlements: i128 = 0;
        let mut next_loan_index: u64 = 0;
        let mut settled_indices = HashSet::new();
        let mut previous_timestamp = None;

        for (position, event) in events.iter().enumerate() {
            let position = position as u64;

            if !event.verify_integrity() {
                integrity_valid = false;
                violations.push(Violation {
                    event_index: position,
                    kind: ViolationKind::IntegrityBreak,
                    description: "integrity hash does not match event content".into(),
                });
            }

            if let Some(prev) = previous_timestamp {
                if event.timestamp <= prev {
                    timestamps_monotonic = false;
                    violations.push(Violation {
                        event_index: position,
                        kind: ViolationKind::NonMonotonicTimestamp,
                        description: format!(
                            "timestamp {} does not advance past {}",
                            event.timestamp, prev
                        ),
                    });
                }
            }
            previous_timestamp = Some(event.timestamp);

            match &event.payload {
                EventPayload::Deposited { amount, .. } => {
                    deposits += i128::from(*amount);
                }
                EventPayload::Withdrawn { amount, .. } => {
                    withdrawals += i128::from(*amount);
                }
                EventPayload::LoanRequested { index, .. } => {
                    if *index != next_loan_index {
                        indices_stable = false;
                        violations.push(Violation {
                            event_index: position,
                            kind: ViolationKind::IndexGap,
                            description: format!(
                                "expected loan index {next_loan_index}, got {index}"
                            ),
                        });
                    }
                    next_loan_index = next_loan_index.max(*index) + 1;
                }
                EventPayload::LoanRepaid { index, total } => {
                    settlements += i128::from(*total);

                    if !settled_indices.insert(*index) {
                        settlements_valid = false;
                        violations.push(Violation {
                            event_index: position,
                            kind: ViolationKind::DoubleSettlement,
                            description: format!("loan {index} settled more than once"),
                        });
                        continue;
                    }

                    match book.get(*index) {
                        Ok(loan) if !loan.repaid => {
                            settlements_valid = false;
                            violations.push(Violation {
                                event_index: position,
                                kind: ViolationKind::SettlementNotRecorded,
                                description: format!(
                                    "journal settles loan {index} but the book holds it open"
                                ),
                            });
                        }
                        Ok(_) => {}
                        Err(_) => {
                            settlements_valid = false;
                            violations.push(Violation {
                                event_index: position,
                                kind: ViolationKind::UnknownLoan,
                                description: format!("settled loan {index} is not in the book"),
                            });
                        }
                    }
                }
            }
        }

        let tracked = i128::from(ledger.total_tracked()?);
        let expected = deposits - withdrawals - settlements;
        let conservation_holds = tracked == expected;
        if !conservation_holds {
            violations.push(Violation {
                event_index: events.len() as u64,
                kind: ViolationKind::ConservationBreak,
                description: format!(
                    "tracked total {tracked} != deposits {deposits} - withdrawals {withdrawals} - settlements {settlements}"
                ),
            });
        }

        Ok(AuditReport {
            event_count: events.len() as u64,
            integrity_valid,
            timestamps_monotonic,
            conservation_holds,
            indices_stable,
            settlements_valid,
            violations,
        })
    }
}
