use plp_types::AccountId;

use crate::error::LedgerError;

/// Write boundary for ledger balance mutation.
pub trait LedgerWrite: Send + Sync {
    /// Add `amount` to the account's balance, returning the new balance.
    fn credit(&self, account: &AccountId, amount: u64) -> Result<u64, LedgerError>;

    /// Subtract `amount` from the account's balance, returning the new balance.
    fn debit(&self, account: &AccountId, amount: u64) -> Result<u64, LedgerError>;
}

/// Read boundary for ledger balance queries.
pub trait LedgerRead: Send + Sync {
    /// The account's current balance; zero for accounts never credited.
    fn balance_of(&self, account: &AccountId) -> Result<u64, LedgerError>;

    /// All accounts the ledger has seen, in identity order.
    fn accounts(&self) -> Result<Vec<AccountId>, LedgerError>;

    /// The sum of every tracked balance.
    fn total_tracked(&self) -> Result<u64, LedgerError>;
}
