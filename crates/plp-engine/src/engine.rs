use tracing::{debug, warn};

use plp_events::{EventBus, EventFilter, EventPayload, EventStream, PoolEvent};
use plp_ledger::{InMemoryLedger, LedgerRead, LedgerWrite};
use plp_loanbook::{InMemoryLoanBook, Loan, LoanBookRead, LoanBookWrite, LoanTerms};
use plp_types::{AccountId, Timestamp};

use crate::audit::{AuditReport, ConservationAuditor};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::replay::ReplayEngine;
use crate::transfer::ValueTransfer;

/// The pool's accounting engine.
///
/// Owns the balance ledger, the loan book, and the notification bus, and
/// routes every mutation through its four operations. The execution
/// environment authenticates callers and passes the caller's identity into
/// each operation; the engine only compares identities.
///
/// # Atomicity
///
/// Each operation validates everything before mutating anything, so any
/// failure leaves the pool untouched. The one external effect, the
/// outbound transfer inside [`withdraw`](Self::withdraw), runs after the
/// debit has committed, and a failed transfer triggers a compensating
/// credit that restores the exact pre-call balance.
pub struct AccountingEngine {
    ledger: InMemoryLedger,
    loans: InMemoryLoanBook,
    events: EventBus,
    transfer: Box<dyn ValueTransfer>,
}

impl AccountingEngine {
    /// Create an empty engine over the given transfer port.
    pub fn new(transfer: Box<dyn ValueTransfer>, config: EngineConfig) -> Self {
        Self::with_state(
            InMemoryLedger::default(),
            InMemoryLoanBook::default(),
            transfer,
            config,
        )
    }

    /// Restore an engine from a prior event journal.
    ///
    /// Replays the journal into fresh stores (verifying every event's
    /// integrity hash) and wraps them in a new engine. The restored engine
    /// starts a fresh journal of its own.
    pub fn from_events(
        events: &[PoolEvent],
        transfer: Box<dyn ValueTransfer>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let state = ReplayEngine::rebuild(events)?;
        Ok(Self::with_state(state.ledger, state.loans, transfer, config))
    }

    /// Create an engine over pre-populated stores.
    ///
    /// Used by journal replay to restore an engine; also handy for tests
    /// that need a specific starting state.
    pub fn with_state(
        ledger: InMemoryLedger,
        loans: InMemoryLoanBook,
        transfer: Box<dyn ValueTransfer>,
        config: EngineConfig,
    ) -> Self {
        Self {
            ledger,
            loans,
            events: EventBus::new(config.bus_config()),
            transfer,
        }
    }

    /// Credit `amount` to the caller's tracked balance.
    ///
    /// The inbound value transfer has already been validated by the
    /// execution environment as part of invoking this operation; the
    /// engine's responsibility is solely the bookkeeping credit.
    pub fn deposit(&self, caller: &AccountId, amount: u64) -> Result<u64, EngineError> {
        let balance = self.ledger.credit(caller, amount)?;
        self.events.emit(EventPayload::Deposited {
            account: caller.clone(),
            amount,
        });

        debug!(caller = %caller, amount, balance, "deposit committed");
        Ok(balance)
    }

    /// Debit `amount` from the caller's balance and transfer it out.
    ///
    /// The debit commits before the external transfer runs, so a
    /// re-entrant call during the transfer observes the already-debited
    /// balance and cannot withdraw the same funds twice. If the transfer
    /// reports failure, a compensating credit restores the pre-call
    /// balance and the operation fails with `TransferFailed`.
    pub fn withdraw(&self, caller: &AccountId, amount: u64) -> Result<u64, EngineError> {
        let balance = self.ledger.debit(caller, amount)?;

        if !self.transfer.transfer(caller, amount) {
            // Compensating rollback. The credit cannot underflow the
            // amount just debited, and the ledger serializes mutation, so
            // the pre-call balance is restored exactly.
            self.ledger.credit(caller, amount)?;
            warn!(caller = %caller, amount, "transfer failed; withdrawal rolled back");
            return Err(EngineError::TransferFailed {
                destination: caller.clone(),
                amount,
            });
        }

        self.events.emit(EventPayload::Withdrawn {
            account: caller.clone(),
            amount,
        });

        debug!(caller = %caller, amount, balance, "withdrawal committed");
        Ok(balance)
    }

    /// Record a new open loan with the caller as borrower and return its
    /// stable index.
    ///
    /// Requesting a loan records terms only: no funds move and no lender
    /// balance is earmarked. Disbursement, if any, is handled outside the
    /// pool's bookkeeping.
    pub fn request_loan(
        &self,
        caller: &AccountId,
        terms: LoanTerms,
        now: Timestamp,
    ) -> Result<u64, EngineError> {
        let index = self.loans.append(caller, terms, now)?;
        let loan = self.loans.get(index)?;

        self.events.emit(EventPayload::LoanRequested {
            index,
            borrower: caller.clone(),
            principal: terms.principal,
            rate: terms.rate,
            duration_secs: terms.duration_secs,
            maturity: loan.maturity,
        });

        debug!(caller = %caller, index, principal = terms.principal, "loan requested");
        Ok(index)
    }

    /// Settle the loan at `index` from the caller's tracked balance.
    ///
    /// The settlement total is principal + principal * rate / 100 in floor
    /// arithmetic, debited from the borrower's own tracked balance; no
    /// accompanying inbound transfer is required or modeled. Returns the
    /// total debited.
    ///
    /// Check order: the loan must exist, the caller must be its borrower,
    /// the loan must still be open, the total must be representable, and
    /// the balance must cover it. Only then do the debit and the repaid
    /// flip apply, as one unit.
    pub fn repay_loan(&self, caller: &AccountId, index: u64) -> Result<u64, EngineError> {
        let loan = self.loans.get(index)?;
        if loan.borrower != *caller {
            return Err(EngineError::Unauthorized {
                index,
                caller: caller.clone(),
            });
        }
        if loan.repaid {
            return Err(plp_loanbook::LoanBookError::AlreadyRepaid { index }.into());
        }

        let total = loan.total_due()?;
        self.ledger.debit(caller, total)?;
        self.loans.mark_repaid(index)?;

        self.events.emit(EventPayload::LoanRepaid { index, total });

        debug!(caller = %caller, index, total, "loan settled");
        Ok(total)
    }

    /// The caller's current tracked balance.
    pub fn balance_of(&self, account: &AccountId) -> Result<u64, EngineError> {
        Ok(self.ledger.balance_of(account)?)
    }

    /// The loan at `index`.
    pub fn loan(&self, index: u64) -> Result<Loan, EngineError> {
        Ok(self.loans.get(index)?)
    }

    /// Number of loans ever recorded.
    pub fn loan_count(&self) -> Result<u64, EngineError> {
        Ok(self.loans.loan_count()?)
    }

    /// Subscribe to pool events matching the given filter.
    pub fn subscribe(&self, filter: EventFilter) -> EventStream {
        self.events.subscribe(filter)
    }

    /// Snapshot of the event journal, in emission order.
    pub fn journal(&self) -> Vec<PoolEvent> {
        self.events.history()
    }

    /// Audit the journal against the live stores.
    pub fn audit(&self) -> Result<AuditReport, EngineError> {
        ConservationAuditor::audit(&self.journal(), &self.ledger, &self.loans)
    }

    /// Read access to the balance ledger.
    pub fn ledger(&self) -> &impl LedgerRead {
        &self.ledger
    }

    /// Read access to the loan book.
    pub fn loan_book(&self) -> &impl LoanBookRead {
        &self.loans
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use plp_events::EventKind;
    use plp_ledger::LedgerError;
    use plp_loanbook::LoanBookError;

    use crate::replay::ReplayEngine;
    use crate::transfer::AcceptingTransfer;

    use super::*;

    fn account(seed: u8) -> AccountId {
        AccountId::derive(&plp_types::AccountMaterial::PublicKey([seed; 32]))
    }

    fn engine() -> AccountingEngine {
        AccountingEngine::new(Box::new(AcceptingTransfer), EngineConfig::default())
    }

    fn terms() -> LoanTerms {
        LoanTerms::new(10, 10, 86_400)
    }

    /// Transfer port that always reports failure.
    struct RejectingTransfer;

    impl ValueTransfer for RejectingTransfer {
        fn transfer(&self, _destination: &AccountId, _amount: u64) -> bool {
            false
        }
    }

    /// Transfer port that records every call it receives.
    struct RecordingTransfer {
        calls: Mutex<Vec<(AccountId, u64)>>,
    }

    impl ValueTransfer for Arc<RecordingTransfer> {
        fn transfer(&self, destination: &AccountId, amount: u64) -> bool {
            self.calls.lock().unwrap().push((destination.clone(), amount));
            true
        }
    }

    /// Transfer port that re-enters the engine mid-transfer, the way a
    /// callback-driven execution environment can.
    struct ReentrantProbe {
        engine: Mutex<Option<Arc<AccountingEngine>>>,
        outcome: bool,
        seen_balance: Mutex<Option<u64>>,
        reentry_error: Mutex<Option<EngineError>>,
        deposit_during_transfer: Option<u64>,
    }

    impl ReentrantProbe {
        fn new(outcome: bool, deposit_during_transfer: Option<u64>) -> Arc<Self> {
            Arc::new(Self {
                engine: Mutex::new(None),
                outcome,
                seen_balance: Mutex::new(None),
                reentry_error: Mutex::new(None),
                deposit_during_transfer,
            })
        }
    }

    impl ValueTransfer for Arc<ReentrantProbe> {
        fn transfer(&self, destination: &AccountId, amount: u64) -> bool {
            let engine = self.engine.lock().unwrap().clone();
            if let Some(engine) = engine {
                *self.seen_balance.lock().unwrap() =
                    Some(engine.balance_of(destination).unwrap());

                if let Some(extra) = self.deposit_during_transfer {
                    engine.deposit(destination, extra).unwrap();
                } else if let Err(error) = engine.withdraw(destination, amount) {
                    *self.reentry_error.lock().unwrap() = Some(error);
                }
            }
            self.outcome
        }
    }

    #[test]
    fn deposit_credits_and_emits() {
        let engine = engine();
        let a = account(1);

        assert_eq!(engine.deposit(&a, 100).unwrap(), 100);
        assert_eq!(engine.balance_of(&a).unwrap(), 100);

        let journal = engine.journal();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].kind(), EventKind::Deposited);
    }

    #[test]
    fn deposit_zero_fails_without_event() {
        let engine = engine();
        let a = account(1);

        let error = engine.deposit(&a, 0).unwrap_err();
        assert_eq!(error, EngineError::Ledger(LedgerError::InvalidAmount));
        assert!(engine.journal().is_empty());
    }

    #[test]
    fn withdraw_debits_transfers_and_emits() {
        let transfer = Arc::new(RecordingTransfer {
            calls: Mutex::new(Vec::new()),
        });
        let engine = AccountingEngine::new(
            Box::new(Arc::clone(&transfer)),
            EngineConfig::default(),
        );
        let a = account(1);

        engine.deposit(&a, 100).unwrap();
        assert_eq!(engine.withdraw(&a, 40).unwrap(), 60);
        assert_eq!(engine.balance_of(&a).unwrap(), 60);

        // The transfer port saw exactly one call with the right arguments.
        let calls = transfer.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(a, 40)]);

        let kinds: Vec<_> = engine.journal().iter().map(PoolEvent::kind).collect();
        assert_eq!(kinds, vec![EventKind::Deposited, EventKind::Withdrawn]);
    }

    #[test]
    fn withdraw_more_than_balance_fails_without_event() {
        let engine = engine();
        let a = account(1);
        engine.deposit(&a, 30).unwrap();

        let error = engine.withdraw(&a, 31).unwrap_err();
        assert_eq!(
            error,
            EngineError::Ledger(LedgerError::InsufficientBalance {
                needed: 31,
                available: 30
            })
        );
        assert_eq!(engine.balance_of(&a).unwrap(), 30);
        assert_eq!(engine.journal().len(), 1); // only the deposit
    }

    #[test]
    fn withdraw_rolls_back_when_transfer_fails() {
        let engine =
            AccountingEngine::new(Box::new(RejectingTransfer), EngineConfig::default());
        let a = account(1);
        engine.deposit(&a, 100).unwrap();

        let error = engine.withdraw(&a, 60).unwrap_err();
        assert_eq!(
            error,
            EngineError::TransferFailed {
                destination: a.clone(),
                amount: 60
            }
        );

        // The post-call balance equals the pre-call balance exactly, and
        // the rolled-back withdrawal left no event behind.
        assert_eq!(engine.balance_of(&a).unwrap(), 100);
        assert_eq!(engine.journal().len(), 1);
    }

    #[test]
    fn reentrant_withdraw_sees_committed_debit() {
        let probe = ReentrantProbe::new(true, None);
        let engine = Arc::new(AccountingEngine::new(
            Box::new(Arc::clone(&probe)),
            EngineConfig::default(),
        ));
        *probe.engine.lock().unwrap() = Some(Arc::clone(&engine));

        let a = account(1);
        engine.deposit(&a, 100).unwrap();
        engine.withdraw(&a, 60).unwrap();

        // During the transfer the debit had already committed...
        assert_eq!(*probe.seen_balance.lock().unwrap(), Some(40));
        // ...so the re-entrant attempt to withdraw the same 60 failed.
        assert_eq!(
            *probe.reentry_error.lock().unwrap(),
            Some(EngineError::Ledger(LedgerError::InsufficientBalance {
                needed: 60,
                available: 40
            }))
        );
        assert_eq!(engine.balance_of(&a).unwrap(), 40);
    }

    #[test]
    fn rollback_preserves_reentrant_deposit() {
        // The transfer fails, but a deposit landed mid-transfer. The
        // rollback must restore only the withdrawn amount, keeping the
        // deposit.
        let probe = ReentrantProbe::new(false, Some(50));
        let engine = Arc::new(AccountingEngine::new(
            Box::new(Arc::clone(&probe)),
            EngineConfig::default(),
        ));
        *probe.engine.lock().unwrap() = Some(Arc::clone(&engine));

        let a = account(1);
        engine.deposit(&a, 100).unwrap();
        let error = engine.withdraw(&a, 60).unwrap_err();
        assert!(matches!(error, EngineError::TransferFailed { .. }));

        assert_eq!(engine.balance_of(&a).unwrap(), 150);
        // Journal holds the two deposits and no withdrawal.
        let kinds: Vec<_> = engine.journal().iter().map(PoolEvent::kind).collect();
        assert_eq!(kinds, vec![EventKind::Deposited, EventKind::Deposited]);
    }

    #[test]
    fn request_loan_assigns_indices_and_moves_no_funds() {
        let engine = engine();
        let b = account(2);
        let now = Timestamp::new(1_000, 0);

        engine.deposit(&b, 100).unwrap();
        assert_eq!(engine.request_loan(&b, terms(), now).unwrap(), 0);
        assert_eq!(engine.request_loan(&b, terms(), now).unwrap(), 1);

        // Requesting a loan records terms only; no balance changes.
        assert_eq!(engine.balance_of(&b).unwrap(), 100);

        let loan = engine.loan(0).unwrap();
        assert_eq!(loan.borrower, b);
        assert_eq!(loan.maturity, Timestamp::new(87_400, 0));
        assert!(!loan.repaid);
        assert_eq!(engine.loan_count().unwrap(), 2);
    }

    #[test]
    fn request_loan_rejects_bad_terms_without_event() {
        let engine = engine();
        let b = account(2);

        let error = engine
            .request_loan(&b, LoanTerms::new(10, 0, 86_400), Timestamp::new(1, 0))
            .unwrap_err();
        assert!(matches!(
            error,
            EngineError::LoanBook(LoanBookError::InvalidLoanTerms { .. })
        ));
        assert!(engine.journal().is_empty());
        assert_eq!(engine.loan_count().unwrap(), 0);
    }

    #[test]
    fn loan_request_event_carries_full_terms() {
        let engine = engine();
        let b = account(2);
        let now = Timestamp::new(1_000, 0);
        engine.request_loan(&b, terms(), now).unwrap();

        let journal = engine.journal();
        match &journal[0].payload {
            EventPayload::LoanRequested {
                index,
                borrower,
                principal,
                rate,
                duration_secs,
                maturity,
            } => {
                assert_eq!(*index, 0);
                assert_eq!(borrower, &b);
                assert_eq!(*principal, 10);
                assert_eq!(*rate, 10);
                assert_eq!(*duration_secs, 86_400);
                assert_eq!(*maturity, Timestamp::new(87_400, 0));
            }
            other => panic!("expected LoanRequested, got {other:?}"),
        }
    }

    #[test]
    fn repay_loan_settles_once_then_rejects() {
        let engine = engine();
        let b = account(2);
        let now = Timestamp::new(1_000, 0);

        engine.deposit(&b, 100).unwrap();
        let index = engine.request_loan(&b, terms(), now).unwrap();

        // 10 principal + 10% interest, floored = 11.
        assert_eq!(engine.repay_loan(&b, index).unwrap(), 11);
        assert_eq!(engine.balance_of(&b).unwrap(), 89);
        assert!(engine.loan(index).unwrap().repaid);

        let error = engine.repay_loan(&b, index).unwrap_err();
        assert_eq!(
            error,
            EngineError::LoanBook(LoanBookError::AlreadyRepaid { index })
        );
        // The second attempt changed nothing.
        assert_eq!(engine.balance_of(&b).unwrap(), 89);
        assert!(engine.loan(index).unwrap().repaid);
    }

    #[test]
    fn repay_loan_by_non_borrower_is_unauthorized() {
        let engine = engine();
        let borrower = account(2);
        let intruder = account(3);
        let now = Timestamp::new(1_000, 0);

        engine.deposit(&borrower, 100).unwrap();
        engine.deposit(&intruder, 100).unwrap();
        let index = engine.request_loan(&borrower, terms(), now).unwrap();

        let error = engine.repay_loan(&intruder, index).unwrap_err();
        assert_eq!(
            error,
            EngineError::Unauthorized {
                index,
                caller: intruder.clone()
            }
        );

        // All state unchanged.
        assert_eq!(engine.balance_of(&borrower).unwrap(), 100);
        assert_eq!(engine.balance_of(&intruder).unwrap(), 100);
        assert!(!engine.loan(index).unwrap().repaid);
    }

    #[test]
    fn repay_loan_with_unknown_index_fails() {
        let engine = engine();
        let error = engine.repay_loan(&account(2), 7).unwrap_err();
        assert_eq!(
            error,
            EngineError::LoanBook(LoanBookError::LoanNotFound { index: 7 })
        );
    }

    #[test]
    fn underfunded_repayment_leaves_loan_open() {
        let engine = engine();
        let b = account(2);
        let now = Timestamp::new(1_000, 0);

        engine.deposit(&b, 10).unwrap();
        let index = engine.request_loan(&b, terms(), now).unwrap();

        // Total due is 11 but only 10 is tracked.
        let error = engine.repay_loan(&b, index).unwrap_err();
        assert_eq!(
            error,
            EngineError::Ledger(LedgerError::InsufficientBalance {
                needed: 11,
                available: 10
            })
        );
        assert_eq!(engine.balance_of(&b).unwrap(), 10);
        assert!(!engine.loan(index).unwrap().repaid);
    }

    #[test]
    fn scenario_deposit_request_repay() {
        let engine = engine();
        let a = account(1);
        let b = account(2);
        let now = Timestamp::new(1_000_000, 0);

        engine.deposit(&a, 100).unwrap();
        assert_eq!(engine.balance_of(&a).unwrap(), 100);

        let index = engine.request_loan(&b, terms(), now).unwrap();
        assert_eq!(index, 0);
        assert_eq!(
            engine.loan(index).unwrap().maturity,
            now.after_secs(86_400).unwrap()
        );

        engine.deposit(&b, 100).unwrap();
        assert_eq!(engine.repay_loan(&b, index).unwrap(), 11);
        assert!(engine.loan(index).unwrap().repaid);
        assert_eq!(engine.balance_of(&b).unwrap(), 89);

        let error = engine.repay_loan(&b, index).unwrap_err();
        assert_eq!(
            error,
            EngineError::LoanBook(LoanBookError::AlreadyRepaid { index })
        );
        assert_eq!(engine.balance_of(&b).unwrap(), 89);
    }

    #[test]
    fn subscriber_sees_each_success_exactly_once() {
        let engine = engine();
        let a = account(1);

        let mut stream = engine.subscribe(EventFilter::default());

        engine.deposit(&a, 100).unwrap();
        engine.deposit(&a, 0).unwrap_err();
        engine.withdraw(&a, 25).unwrap();

        assert_eq!(stream.try_recv().unwrap().kind(), EventKind::Deposited);
        assert_eq!(stream.try_recv().unwrap().kind(), EventKind::Withdrawn);
        assert!(stream.try_recv().is_err());
    }

    #[test]
    fn journal_audits_clean_and_replays_to_live_state() {
        let engine = engine();
        let a = account(1);
        let b = account(2);
        let now = Timestamp::new(1_000, 0);

        engine.deposit(&a, 500).unwrap();
        engine.deposit(&b, 100).unwrap();
        engine.withdraw(&a, 120).unwrap();
        let index = engine.request_loan(&b, terms(), now).unwrap();
        engine.repay_loan(&b, index).unwrap();

        let report = engine.audit().unwrap();
        assert!(report.is_clean(), "unexpected violations: {report:?}");

        // Conservation: 600 deposited - 120 withdrawn - 11 settled.
        assert_eq!(engine.ledger().total_tracked().unwrap(), 469);

        assert!(ReplayEngine::verify_convergence(
            &engine.journal(),
            engine.ledger(),
            engine.loan_book()
        )
        .unwrap());
    }

    #[test]
    fn from_events_restores_balances_and_loans() {
        let engine = engine();
        let a = account(1);
        let b = account(2);
        let now = Timestamp::new(1_000, 0);

        engine.deposit(&a, 300).unwrap();
        engine.deposit(&b, 50).unwrap();
        let index = engine.request_loan(&b, terms(), now).unwrap();
        engine.repay_loan(&b, index).unwrap();
        engine.withdraw(&a, 100).unwrap();

        let restored = AccountingEngine::from_events(
            &engine.journal(),
            Box::new(AcceptingTransfer),
            EngineConfig::default(),
        )
        .unwrap();

        assert_eq!(restored.balance_of(&a).unwrap(), 200);
        assert_eq!(restored.balance_of(&b).unwrap(), 39);
        assert_eq!(restored.loan_count().unwrap(), 1);
        assert!(restored.loan(index).unwrap().repaid);
        // The restored engine starts a fresh journal.
        assert!(restored.journal().is_empty());
    }
}
