//! Events that advance an upload session

/// Events that can trigger session state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionEvent {
    /// Port opened, lines asserted, stale input drained
    Opened,
    /// Handshake ACK byte seen
    HandshakeAcked,
    /// Mode-select byte sent and settled
    ModeSelected,
    /// Init, config or setup frame acknowledged
    FrameAcked,
    /// Every data chunk acknowledged
    ChunksDone,
    /// Completion frame sent
    Committed,
    /// Failure, cancellation or transport error
    Abort,
}

impl SessionEvent {
    /// Check if this event ends the session
    pub fn is_terminal_event(&self) -> bool {
        matches!(self, SessionEvent::Committed | SessionEvent::Abort)
    }
}
