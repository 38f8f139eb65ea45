use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Wall-clock/sequence timestamp.
///
/// Combines whole seconds since the UNIX epoch with a sequence counter for
/// events stamped within the same second. The sequence component lets the
/// pool's clock hand out strictly increasing timestamps without requiring
/// sub-second wall-clock resolution.
///
/// Ordering: `secs` → `seq` (total order).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Whole seconds since the UNIX epoch.
    pub secs: u64,
    /// Sequence counter for events within the same second.
    pub seq: u32,
}

impl Timestamp {
    /// Create a new timestamp with explicit values.
    pub fn new(secs: u64, seq: u32) -> Self {
        Self { secs, seq }
    }

    /// Create a timestamp for the current wall-clock time.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self { secs, seq: 0 }
    }

    /// The zero timestamp (epoch).
    pub const fn zero() -> Self {
        Self { secs: 0, seq: 0 }
    }

    /// The timestamp `secs` seconds after this one, or `None` on overflow.
    ///
    /// The sequence component is reset; a derived point in time such as a
    /// loan maturity sits at the start of its second.
    pub fn after_secs(&self, secs: u64) -> Option<Self> {
        self.secs.checked_add(secs).map(|s| Self { secs: s, seq: 0 })
    }

    /// Returns `true` if this timestamp is after `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }

    /// Returns `true` if this timestamp is before `other`.
    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.secs.cmp(&other.secs).then(self.seq.cmp(&other.seq))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}s.{})", self.secs, self.seq)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.secs, self.seq)
    }
}
