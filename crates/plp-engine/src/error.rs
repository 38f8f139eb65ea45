use plp_ledger::LedgerError;
use plp_loanbook::LoanBookError;
use plp_types::AccountId;

/// Errors surfaced by engine operations.
///
/// Ledger and loan book failures pass through unchanged; the engine adds
/// the kinds only it can detect: authorization failures, external transfer
/// failures, and journal integrity violations found during replay.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    LoanBook(#[from] LoanBookError),

    #[error("caller {caller} is not the borrower of loan {index}")]
    Unauthorized { index: u64, caller: AccountId },

    #[error("transfer of {amount} to {destination} failed; ledger rolled back")]
    TransferFailed {
        destination: AccountId,
        amount: u64,
    },

    #[error("integrity violation in journal event {index}: {reason}")]
    IntegrityViolation { index: u64, reason: String },
}
