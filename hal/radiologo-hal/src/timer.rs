//! Time source abstraction
//!
//! Session deadlines are computed from [`Timer::now_ms`] and every pause
//! goes through [`Timer::delay_ms`], so tests can run the full protocol
//! against a fake clock.

/// Monotonic clock with blocking delay
pub trait Timer {
    /// Milliseconds since an arbitrary fixed point
    fn now_ms(&self) -> u64;

    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);

    /// Milliseconds left until `deadline_ms`, saturating at zero
    fn remaining_ms(&self, deadline_ms: u64) -> u32 {
        let left = deadline_ms.saturating_sub(self.now_ms());
        u32::try_from(left).unwrap_or(u32::MAX)
    }
}
