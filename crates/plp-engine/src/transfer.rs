use plp_types::AccountId;

/// Port to the execution environment's value-transfer primitive.
///
/// Moves native currency out of the pool to a destination address and
/// reports success or failure. The engine treats any non-success result as
/// a hard failure requiring a full rollback of the operation that invoked
/// it.
///
/// Implementations may re-enter the engine before returning; a transfer
/// callback is the one place pool operations can nest. The engine commits
/// its debit before calling `transfer`, so a re-entrant caller only ever
/// observes committed balances.
pub trait ValueTransfer: Send + Sync {
    /// Move `amount` to `destination`. Returns `true` on success.
    fn transfer(&self, destination: &AccountId, amount: u64) -> bool;
}

/// Transfer port that accepts every transfer.
///
/// For tests, local demos, and embedding in environments where the
/// outbound transfer is handled elsewhere.
pub struct AcceptingTransfer;

impl ValueTransfer for AcceptingTransfer {
    fn transfer(&self, _destination: &AccountId, _amount: u64) -> bool {
        true
    }
}
