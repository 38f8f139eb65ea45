use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use plp_types::AccountId;

use crate::error::LedgerError;
use crate::traits::{LedgerRead, LedgerWrite};

/// In-memory balance ledger for tests, local demos, and embedding.
///
/// All mutation goes through checked arithmetic: a credit that would push a
/// balance past `u64::MAX` fails with [`LedgerError::Overflow`], a debit
/// larger than the balance fails with [`LedgerError::InsufficientBalance`],
/// and in both cases the stored balance is untouched.
#[derive(Debug)]
pub struct InMemoryLedger {
    balances: RwLock<HashMap<AccountId, u64>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            balances: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerWrite for InMemoryLedger {
    fn credit(&self, account: &AccountId, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let mut balances = self
            .balances
            .write()
            .map_err(|_| LedgerError::Store("ledger write lock poisoned".into()))?;

        let balance = balances.entry(account.clone()).or_insert(0);
        let updated = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        *balance = updated;

        debug!(account = %account, amount, balance = updated, "credit applied");
        Ok(updated)
    }

    fn debit(&self, account: &AccountId, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let mut balances = self
            .balances
            .write()
            .map_err(|_| LedgerError::Store("ledger write lock poisoned".into()))?;

        // Accounts default to zero; a debit against an unseen account is an
        // underfunded debit, not a missing-account error. A failed debit
        // must leave no trace, so the entry is only touched on success.
        let available = balances.get(account).copied().unwrap_or(0);
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        let updated = available - amount;
        balances.insert(account.clone(), updated);

        debug!(account = %account, amount, balance = updated, "debit applied");
        Ok(updated)
    }
}

impl LedgerRead for InMemoryLedger {
    fn balance_of(&self, account: &AccountId) -> Result<u64, LedgerError> {
        let balances = self
            .balances
            .read()
            .map_err(|_| LedgerError::Store("ledger read lock poisoned".into()))?;

        Ok(balances.get(account).copied().unwrap_or(0))
    }

    fn accounts(&self) -> Result<Vec<AccountId>, LedgerError> {
        let balances = self
            .balances
            .read()
            .map_err(|_| LedgerError::Store("ledger read lock poisoned".into()))?;

        let mut ids: Vec<_> = balances.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn total_tracked(&self) -> Result<u64, LedgerError> {
        let balances = self
            .balances
            .read()
            .map_err(|_| LedgerError::Store("ledger read lock poisoned".into()))?;

        balances
            .values()
            .try_fold(0u64, |sum, balance| sum.checked_add(*balance))
            .ok_or(LedgerError::Overflow)
    }
}
