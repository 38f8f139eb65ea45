use serde::{Deserialize, Serialize};

use plp_types::{AccountId, Timestamp};

/// Unique identifier for a pool event.
///
/// A BLAKE3 hash of the event content plus its timestamp, making the
/// identifier both time-ordered within a bus and content-addressable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    /// Content hash of the event (BLAKE3).
    pub hash: [u8; 32],
}

impl EventId {
    /// Create an `EventId` from a raw hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self { hash }
    }

    /// Short hex representation (first 8 hex chars).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.hash[..4])
    }

    /// Full hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "evt:{}", self.short_hex())
    }
}

/// Classification of pool events, one per engine operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Funds were credited to an account.
    Deposited,
    /// A new loan was recorded in the book.
    LoanRequested,
    /// A loan was settled by its borrower.
    LoanRepaid,
    /// Funds were debited and transferred out of the pool.
    Withdrawn,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Deposited => "Deposited",
            Self::LoanRequested => "LoanRequested",
            Self::LoanRepaid => "LoanRepaid",
            Self::Withdrawn => "Withdrawn",
        };
        write!(f, "{s}")
    }
}

/// Payload data carried by a pool event.
///
/// Each variant carries exactly the fields of the operation it notifies
/// about, so the journal alone is enough to rebuild pool state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    /// `deposit` credited an account.
    Deposited { account: AccountId, amount: u64 },
    /// `request_loan` appended a loan at `index`.
    LoanRequested {
        index: u64,
        borrower: AccountId,
        principal: u64,
        rate: u32,
        duration_secs: u64,
        maturity: Timestamp,
    },
    /// `repay_loan` settled the loan at `index` for `total`.
    LoanRepaid { index: u64, total: u64 },
    /// `withdraw` debited an account and transferred the amount out.
    Withdrawn { account: AccountId, amount: u64 },
}

impl EventPayload {
    /// The classification of this payload.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Deposited { .. } => EventKind::Deposited,
            Self::LoanRequested { .. } => EventKind::LoanRequested,
            Self::LoanRepaid { .. } => EventKind::LoanRepaid,
            Self::Withdrawn { .. } => EventKind::Withdrawn,
        }
    }

    /// The account the payload concerns, where it names one.
    ///
    /// `LoanRepaid` carries only the loan index and settlement total; the
    /// borrower is recoverable from the loan book.
    pub fn account(&self) -> Option<&AccountId> {
        match self {
            Self::Deposited { account, .. } | Self::Withdrawn { account, .. } => Some(account),
            Self::LoanRequested { borrower, .. } => Some(borrower),
            Self::LoanRepaid { .. } => None,
        }
    }
}

/// A single notification flowing out of the pool.
///
/// Every event carries a content-addressed ID, a strictly increasing bus
/// timestamp, the typed payload, and a BLAKE3 integrity hash computed over
/// the serialized (timestamp + payload).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEvent {
    /// Unique event identifier (content-addressed).
    pub id: EventId,
    /// Bus timestamp when the event was emitted.
    pub timestamp: Timestamp,
    /// Operation-specific payload data.
    pub payload: EventPayload,
    /// BLAKE3 integrity hash over (timestamp, payload).
    pub integrity_hash: [u8; 32],
}

impl PoolEvent {
    /// Build a new `PoolEvent`, computing its integrity hash and event ID.
    pub fn new(timestamp: Timestamp, payload: EventPayload) -> Self {
        let integrity_hash = Self::compute_integrity(&timestamp, &payload);
        let id = EventId::from_hash(integrity_hash);
        Self {
            id,
            timestamp,
            payload,
            integrity_hash,
        }
    }

    /// The classification of this event.
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Verify the event's integrity hash matches its content.
    pub fn verify_integrity(&self) -> bool {
        let expected = Self::compute_integrity(&self.timestamp, &self.payload);
        self.integrity_hash == expected
    }

    /// Compute the BLAKE3 integrity hash over the event's core fields.
    fn compute_integrity(timestamp: &Timestamp, payload: &EventPayload) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"plp-pool-event-v1:");

        hasher.update(&timestamp.secs.to_le_bytes());
        hasher.update(&timestamp.seq.to_le_bytes());

        // Hash the payload via bincode
        if let Ok(payload_bytes) = bincode::serialize(payload) {
            hasher.update(&payload_bytes);
        }

        *hasher.finalize().as_bytes()
    }
}
