use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use plp_types::Timestamp;

/// Internal mutable state of the monotonic clock.
struct ClockState {
    /// Last-known wall-clock second.
    secs: u64,
    /// Sequence counter for events within the same second.
    seq: u32,
}

/// Monotonic event clock.
///
/// Combines wall-clock seconds with a sequence counter to produce strictly
/// increasing [`Timestamp`] values. Safe for concurrent use across threads
/// via an internal [`Mutex`].
///
/// # Rules
///
/// - `secs = max(wall_clock, state.secs)`. If the wall clock advanced,
///   `seq` resets to 0; otherwise `seq += 1`.
/// - **Guarantee**: every returned timestamp is strictly greater than any
///   previously returned one.
pub struct MonotonicClock {
    /// Mutable clock state protected by a mutex.
    state: Mutex<ClockState>,
}

impl MonotonicClock {
    /// Create a new clock.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClockState { secs: 0, seq: 0 }),
        }
    }

    /// Generate a new strictly increasing timestamp.
    pub fn now(&self) -> Timestamp {
        let wall = Self::wall_clock_secs();
        let mut state = self.state.lock().expect("clock mutex poisoned");

        let new_secs = wall.max(state.secs);

        let new_seq = if new_secs > state.secs {
            // Wall clock advanced; reset the sequence counter.
            0
        } else {
            // Same second; increment the sequence counter.
            state.seq + 1
        };

        state.secs = new_secs;
        state.seq = new_seq;

        Timestamp::new(new_secs, new_seq)
    }

    /// Current wall-clock time in whole seconds since the UNIX epoch.
    fn wall_clock_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}
