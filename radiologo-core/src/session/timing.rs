//! Timing profiles
//!
//! All values are milliseconds. Slow-booting radios need longer waits,
//! so later attempts may switch to [`TimingProfile::CONSERVATIVE`].

/// Waits and timeouts used by one upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingProfile {
    /// Settle time after opening the port and asserting DTR/RTS
    pub open_settle_ms: u32,
    /// How long stale input is drained before the handshake
    pub drain_window_ms: u32,
    /// Wait for the handshake ACK before pulsing the control lines
    pub handshake_wait_ms: u32,
    /// Total handshake budget, pulse phase included
    pub handshake_budget_ms: u32,
    /// Time DTR/RTS are held low during the pulse
    pub pulse_low_ms: u32,
    /// Settle time after DTR/RTS go high again
    pub pulse_settle_ms: u32,
    /// Settle time after the mode-select byte
    pub mode_settle_ms: u32,
    /// ACK timeout for init, config and setup frames
    pub frame_ack_timeout_ms: u32,
    /// ACK timeout for each data chunk
    pub chunk_ack_timeout_ms: u32,
    /// Wait for the optional completion response
    pub completion_timeout_ms: u32,
}

impl TimingProfile {
    /// First-attempt timings
    pub const NORMAL: Self = Self {
        open_settle_ms: 100,
        drain_window_ms: 100,
        handshake_wait_ms: 1000,
        handshake_budget_ms: 2000,
        pulse_low_ms: 50,
        pulse_settle_ms: 100,
        mode_settle_ms: 200,
        frame_ack_timeout_ms: 1000,
        chunk_ack_timeout_ms: 2000,
        completion_timeout_ms: 300,
    };

    /// Retry timings for slow-booting radios
    pub const CONSERVATIVE: Self = Self {
        open_settle_ms: 300,
        drain_window_ms: 250,
        handshake_wait_ms: 2500,
        handshake_budget_ms: 5000,
        pulse_low_ms: 100,
        pulse_settle_ms: 300,
        mode_settle_ms: 400,
        frame_ack_timeout_ms: 2000,
        chunk_ack_timeout_ms: 3000,
        completion_timeout_ms: 300,
    };
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self::NORMAL
    }
}
