/// Errors produced by loan book operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoanBookError {
    #[error("invalid loan terms: {reason}")]
    InvalidLoanTerms { reason: String },

    #[error("no loan at index {index}")]
    LoanNotFound { index: u64 },

    #[error("loan {index} is already repaid")]
    AlreadyRepaid { index: u64 },

    #[error("loan arithmetic overflow")]
    Overflow,

    #[error("store error: {0}")]
    Store(String),
}
