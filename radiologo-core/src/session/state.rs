//! Upload session state definition
//!
//! One session covers one attempt. The uploader only moves forward; any
//! failure sends the session to `Aborted`.

use super::events::SessionEvent;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// Opening the port, asserting DTR/RTS and draining stale bytes
    Opening,
    /// Magic sent, waiting for the ACK byte
    Handshaking,
    /// Mode-select byte sent, settling
    ModeSwitch,
    /// Init frame in flight
    Init,
    /// Config frame in flight
    Config,
    /// Setup frame in flight
    Setup,
    /// Data chunks being written to flash
    DataTransfer,
    /// Completion frame in flight
    Completion,
    /// Upload finished
    Closed,
    /// Attempt ended early
    Aborted,
}

impl SessionState {
    /// Check if the radio has not been written to yet
    ///
    /// Failures in these states are eligible for a prewrite retry.
    pub fn is_prewrite(&self) -> bool {
        matches!(
            self,
            SessionState::Opening
                | SessionState::Handshaking
                | SessionState::ModeSwitch
                | SessionState::Init
                | SessionState::Config
                | SessionState::Setup
        )
    }

    /// Check if flash contents may already have changed
    pub fn writes_flash(&self) -> bool {
        matches!(self, SessionState::DataTransfer | SessionState::Completion)
    }

    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Aborted)
    }

    /// Human-readable phase name
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Opening => "opening",
            SessionState::Handshaking => "handshaking",
            SessionState::ModeSwitch => "mode switch",
            SessionState::Init => "init",
            SessionState::Config => "config",
            SessionState::Setup => "setup",
            SessionState::DataTransfer => "data transfer",
            SessionState::Completion => "completion",
            SessionState::Closed => "closed",
            SessionState::Aborted => "aborted",
        }
    }

    /// Process an event and return the next state
    ///
    /// Events that do not apply to the current state leave it unchanged.
    pub fn transition(self, event: SessionEvent) -> Self {
        use SessionEvent::*;
        use SessionState::*;

        match (self, event) {
            (Opening, Opened) => Handshaking,
            (Handshaking, HandshakeAcked) => ModeSwitch,
            (ModeSwitch, ModeSelected) => Init,
            (Init, FrameAcked) => Config,
            (Config, FrameAcked) => Setup,
            (Setup, FrameAcked) => DataTransfer,
            (DataTransfer, ChunksDone) => Completion,
            (Completion, Committed) => Closed,

            (Closed, _) | (Aborted, _) => self,
            (_, Abort) => Aborted,

            _ => self,
        }
    }
}

impl core::fmt::Display for SessionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let events = [
            SessionEvent::Opened,
            SessionEvent::HandshakeAcked,
            SessionEvent::ModeSelected,
            SessionEvent::FrameAcked,
            SessionEvent::FrameAcked,
            SessionEvent::FrameAcked,
            SessionEvent::ChunksDone,
            SessionEvent::Committed,
        ];
        let state = events
            .iter()
            .fold(SessionState::Opening, |s, &e| s.transition(e));
        assert_eq!(state, SessionState::Closed);
    }

    #[test]
    fn test_ack_order() {
        let s = SessionState::Init.transition(SessionEvent::FrameAcked);
        assert_eq!(s, SessionState::Config);
        let s = s.transition(SessionEvent::FrameAcked);
        assert_eq!(s, SessionState::Setup);
        let s = s.transition(SessionEvent::FrameAcked);
        assert_eq!(s, SessionState::DataTransfer);
    }

    #[test]
    fn test_abort_from_any_live_state() {
        for state in [
            SessionState::Opening,
            SessionState::Handshaking,
            SessionState::Setup,
            SessionState::DataTransfer,
            SessionState::Completion,
        ] {
            assert_eq!(state.transition(SessionEvent::Abort), SessionState::Aborted);
        }
    }

    #[test]
    fn test_terminal_states_stick() {
        assert_eq!(
            SessionState::Closed.transition(SessionEvent::Abort),
            SessionState::Closed
        );
        assert_eq!(
            SessionState::Aborted.transition(SessionEvent::Opened),
            SessionState::Aborted
        );
    }

    #[test]
    fn test_out_of_order_event_ignored() {
        assert_eq!(
            SessionState::Handshaking.transition(SessionEvent::ChunksDone),
            SessionState::Handshaking
        );
    }

    #[test]
    fn test_phase_classes() {
        assert!(SessionState::Setup.is_prewrite());
        assert!(!SessionState::DataTransfer.is_prewrite());
        assert!(SessionState::DataTransfer.writes_flash());
        assert!(SessionState::Completion.writes_flash());
        assert!(!SessionState::Init.writes_flash());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn any_event() -> impl Strategy<Value = SessionEvent> {
            prop_oneof![
                Just(SessionEvent::Opened),
                Just(SessionEvent::HandshakeAcked),
                Just(SessionEvent::ModeSelected),
                Just(SessionEvent::FrameAcked),
                Just(SessionEvent::ChunksDone),
                Just(SessionEvent::Committed),
                Just(SessionEvent::Abort),
            ]
        }

        proptest! {
            #[test]
            fn terminal_state_is_final(events in proptest::collection::vec(any_event(), 0..40)) {
                let mut state = SessionState::Opening;
                let mut ended: Option<SessionState> = None;
                for event in events {
                    state = state.transition(event);
                    if let Some(end) = ended {
                        prop_assert_eq!(state, end);
                    } else if state.is_terminal() {
                        ended = Some(state);
                    }
                }
            }

            #[test]
            fn flash_writes_never_precede_setup(events in proptest::collection::vec(any_event(), 0..40)) {
                let mut state = SessionState::Opening;
                let mut seen_setup = false;
                for event in events {
                    state = state.transition(event);
                    seen_setup |= state == SessionState::Setup;
                    if state.writes_flash() {
                        prop_assert!(seen_setup);
                    }
                }
            }
        }
    }
}
