//! Uploader
//!
//! Owns the transport and timer, runs the safety gate, then drives one
//! [`Session`] per attempt until the upload commits or a non-retryable
//! error ends it.
//!
//! ```text
//! Opening -> Handshaking -> ModeSwitch -> Init -> Config -> Setup
//!    |            |              |          |        |        |
//!    +------------+--- prewrite: retried with backoff --------+
//!                                                             v
//!                              Closed <- Completion <- DataTransfer
//!                                                      (never retried)
//! ```

use core::num::NonZeroUsize;

use radiologo_hal::{ControlSignals, SerialConfig, Timer, Transport};
use radiologo_protocol::commands::{
    COMPLETE_OK, COMPLETE_PAYLOAD, CONFIG_ADDRESS, CONFIG_PAYLOAD, HANDSHAKE_ACK,
    INIT_PAYLOAD, MODE_SWITCH, SETUP_PAYLOAD,
};
use radiologo_protocol::{build_frame, calc_address, chunk, AckShape, Command, MAX_FRAME_SIZE};

use super::events::SessionEvent;
use super::reader::{read_ack_frame, AckRead};
use super::simulate::frame_stream;
use super::state::SessionState;
use super::timing::TimingProfile;
use crate::config::UploadSettings;
use crate::error::{capture, PlanError, ProtocolError, RawBytes, UploadError};
use crate::observer::UploadObserver;
use crate::safety::{require_write_permission, Permission, SafetyContext};

/// Reads spent clearing stale input before the completion frame
const STALE_READS: usize = 16;

/// Log through the crate logger and the observer at once
macro_rules! note {
    ($observer:expr, $level:ident, $s:literal $(, $x:expr)* $(,)?) => {{
        $level!($s $(, $x)*);
        $observer.on_log(format_args!($s $(, $x)*));
    }};
}

/// Summary of a finished upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UploadReport {
    /// Data frames written
    pub frames_sent: usize,
    /// Image bytes acknowledged (padding excluded)
    pub bytes_sent: usize,
    /// Attempts used; zero for a simulation
    pub attempts: u8,
    /// First byte of the completion response, if the radio sent one
    pub completion_response: Option<u8>,
    /// Nothing was written to the radio
    pub simulated: bool,
}

/// Boot-logo uploader
pub struct Uploader<T, C> {
    transport: T,
    timer: C,
    settings: UploadSettings,
}

impl<T, C> Uploader<T, C>
where
    T: Transport,
    C: Timer,
{
    pub fn new(transport: T, timer: C, settings: UploadSettings) -> Self {
        Self {
            transport,
            timer,
            settings,
        }
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport and timer
    pub fn into_parts(self) -> (T, C) {
        (self.transport, self.timer)
    }

    /// Upload a converted logo payload
    ///
    /// The safety gate runs first. A simulation emits the frame stream
    /// through [`UploadObserver::on_frame`] and never touches the
    /// transport. Otherwise failures before the first data chunk are
    /// retried per the settings' retry policy; the transport is closed
    /// after every attempt.
    pub fn upload<O: UploadObserver>(
        &mut self,
        ctx: &SafetyContext<'_>,
        image: &[u8],
        observer: &mut O,
    ) -> Result<UploadReport, UploadError<T::Error>> {
        let permission = require_write_permission(ctx).map_err(|e| {
            warn!("write refused: {}", e);
            UploadError::Safety(e)
        })?;

        let chunk_size = self
            .settings
            .validate(image.len())
            .map_err(UploadError::Plan)?;

        if permission == Permission::Simulate {
            note!(observer, info, "simulation only, nothing will be written");
            let frames = frame_stream::<T::Error, _>(&self.settings, image, |bytes| {
                observer.on_frame(bytes)
            })?;
            return Ok(UploadReport {
                frames_sent: frames,
                bytes_sent: image.len(),
                attempts: 0,
                completion_response: None,
                simulated: true,
            });
        }

        let policy = self.settings.retry_policy();
        let mut attempt = 1;

        loop {
            let session = Session {
                transport: &mut self.transport,
                timer: &mut self.timer,
                profile: policy.profile_for(attempt),
                state: SessionState::Opening,
                attempt,
            };

            match session.run(&self.settings, chunk_size, image, observer) {
                Ok(outcome) => {
                    info!(
                        "upload complete: {} frames, {} bytes, attempt {}",
                        outcome.frames, outcome.bytes, attempt
                    );
                    return Ok(UploadReport {
                        frames_sent: outcome.frames,
                        bytes_sent: outcome.bytes,
                        attempts: attempt,
                        completion_response: outcome.response,
                        simulated: false,
                    });
                }
                Err(err) if policy.should_retry(attempt, &err) => {
                    note!(
                        observer,
                        warn,
                        "attempt {} of {} failed before writing, retrying",
                        attempt,
                        policy.max_attempts()
                    );
                    self.timer.delay_ms(policy.backoff_ms);
                    attempt += 1;
                }
                Err(err) => {
                    error!("upload failed on attempt {}", attempt);
                    return Err(err);
                }
            }
        }
    }
}

struct Outcome {
    frames: usize,
    bytes: usize,
    response: Option<u8>,
}

/// One attempt over a borrowed transport
struct Session<'u, T, C> {
    transport: &'u mut T,
    timer: &'u mut C,
    profile: TimingProfile,
    state: SessionState,
    attempt: u8,
}

impl<T, C> Session<'_, T, C>
where
    T: Transport,
    C: Timer,
{
    fn run<O: UploadObserver>(
        mut self,
        settings: &UploadSettings,
        chunk_size: NonZeroUsize,
        image: &[u8],
        observer: &mut O,
    ) -> Result<Outcome, UploadError<T::Error>> {
        observer.on_state(self.state, self.attempt);

        let result = self.drive(settings, chunk_size, image, observer);
        self.transport.close();

        if result.is_err() {
            debug!("attempt {} aborted during {}", self.attempt, self.state);
            self.advance(SessionEvent::Abort, observer);
        }
        result
    }

    fn drive<O: UploadObserver>(
        &mut self,
        settings: &UploadSettings,
        chunk_size: NonZeroUsize,
        image: &[u8],
        observer: &mut O,
    ) -> Result<Outcome, UploadError<T::Error>> {
        self.open(settings, observer)?;
        self.handshake(settings.handshake_magic, observer)?;
        self.mode_switch(observer)?;
        self.control(Command::Init, 0, INIT_PAYLOAD, observer)?;
        self.control(Command::Config, CONFIG_ADDRESS, CONFIG_PAYLOAD, observer)?;
        self.control(Command::Setup, 0, SETUP_PAYLOAD, observer)?;
        let (frames, bytes) = self.transfer(settings, chunk_size, image, observer)?;
        let response = self.complete(observer)?;
        Ok(Outcome {
            frames,
            bytes,
            response,
        })
    }

    fn advance<O: UploadObserver>(&mut self, event: SessionEvent, observer: &mut O) {
        let next = self.state.transition(event);
        if next != self.state {
            trace!("{} -> {}", self.state, next);
            self.state = next;
            observer.on_state(next, self.attempt);
        }
    }

    fn checkpoint<O: UploadObserver>(
        &self,
        observer: &mut O,
    ) -> Result<(), UploadError<T::Error>> {
        if observer.cancel_requested() {
            warn!("cancelled during {}", self.state);
            return Err(UploadError::Cancelled { state: self.state });
        }
        Ok(())
    }

    fn io(&self, error: T::Error) -> UploadError<T::Error> {
        UploadError::Transport {
            error,
            state: self.state,
            attempt: self.attempt,
        }
    }

    fn protocol(&self, error: ProtocolError) -> UploadError<T::Error> {
        UploadError::Protocol {
            error,
            attempt: self.attempt,
        }
    }

    fn open<O: UploadObserver>(
        &mut self,
        settings: &UploadSettings,
        observer: &mut O,
    ) -> Result<(), UploadError<T::Error>> {
        self.checkpoint(observer)?;
        info!(
            "opening port at {} baud, attempt {}",
            settings.baud_rate, self.attempt
        );

        let config = SerialConfig::with_baudrate(settings.baud_rate);
        self.transport.open(&config).map_err(|e| self.io(e))?;
        self.transport
            .set_signals(ControlSignals::HIGH)
            .map_err(|e| self.io(e))?;
        self.timer.delay_ms(self.profile.open_settle_ms);

        let drained = self.drain()?;
        if drained > 0 {
            debug!("drained {} stale bytes", drained);
        }

        self.advance(SessionEvent::Opened, observer);
        Ok(())
    }

    /// Discard input for at most the drain window
    fn drain(&mut self) -> Result<usize, UploadError<T::Error>> {
        let deadline = self.timer.now_ms() + u64::from(self.profile.drain_window_ms);
        let mut buf = [0u8; 64];
        let mut total = 0;

        loop {
            let remaining = self.timer.remaining_ms(deadline);
            if remaining == 0 {
                break;
            }
            let n = self
                .transport
                .read_at_most(&mut buf, remaining)
                .map_err(|e| self.io(e))?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }

    /// Throw away pushed-back and already buffered input without waiting
    fn discard_pending(&mut self) -> Result<usize, UploadError<T::Error>> {
        let mut buf = [0u8; 64];
        let mut total = 0;

        for _ in 0..STALE_READS {
            let n = self
                .transport
                .read_at_most(&mut buf, 0)
                .map_err(|e| self.io(e))?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }

    fn handshake<O: UploadObserver>(
        &mut self,
        magic: &[u8],
        observer: &mut O,
    ) -> Result<(), UploadError<T::Error>> {
        self.checkpoint(observer)?;

        let started = self.timer.now_ms();
        let budget = self.profile.handshake_budget_ms;
        let budget_deadline = started + u64::from(budget);
        let direct_deadline = started + u64::from(self.profile.handshake_wait_ms.min(budget));
        let mut received = RawBytes::new();

        debug!("sending handshake magic");
        self.transport.write(magic).map_err(|e| self.io(e))?;
        if self.await_handshake_ack(direct_deadline, &mut received)? {
            self.advance(SessionEvent::HandshakeAcked, observer);
            return Ok(());
        }

        note!(observer, info, "no handshake reply, pulsing DTR/RTS");
        self.checkpoint(observer)?;
        self.transport
            .set_signals(ControlSignals::LOW)
            .map_err(|e| self.io(e))?;
        self.timer.delay_ms(self.profile.pulse_low_ms);
        self.transport
            .set_signals(ControlSignals::HIGH)
            .map_err(|e| self.io(e))?;
        self.timer.delay_ms(self.profile.pulse_settle_ms);

        self.transport.write(magic).map_err(|e| self.io(e))?;
        if self.await_handshake_ack(budget_deadline, &mut received)? {
            self.advance(SessionEvent::HandshakeAcked, observer);
            return Ok(());
        }

        warn!(
            "no handshake ACK within {} ms",
            self.timer.now_ms().saturating_sub(started)
        );
        Err(self.protocol(ProtocolError::HandshakeFailed { received }))
    }

    /// Wait for the ACK byte anywhere in the incoming bytes
    ///
    /// Bytes after the ACK are pushed back for the next reader.
    fn await_handshake_ack(
        &mut self,
        deadline: u64,
        received: &mut RawBytes,
    ) -> Result<bool, UploadError<T::Error>> {
        let mut buf = [0u8; 64];

        loop {
            let remaining = self.timer.remaining_ms(deadline);
            if remaining == 0 {
                return Ok(false);
            }

            let n = self
                .transport
                .read_at_most(&mut buf, remaining)
                .map_err(|e| self.io(e))?;
            let got = &buf[..n];
            capture(received, got);

            if let Some(pos) = got.iter().position(|&b| b == HANDSHAKE_ACK) {
                if pos > 0 {
                    trace!("{} noise bytes before handshake ACK", pos);
                }
                if pos + 1 < n {
                    self.transport.unread(&got[pos + 1..]);
                }
                return Ok(true);
            }
        }
    }

    fn mode_switch<O: UploadObserver>(
        &mut self,
        observer: &mut O,
    ) -> Result<(), UploadError<T::Error>> {
        self.checkpoint(observer)?;
        self.transport.write(&[MODE_SWITCH]).map_err(|e| self.io(e))?;
        self.timer.delay_ms(self.profile.mode_settle_ms);
        self.advance(SessionEvent::ModeSelected, observer);
        Ok(())
    }

    /// Send one init/config/setup frame and require its ACK
    fn control<O: UploadObserver>(
        &mut self,
        cmd: Command,
        addr: u16,
        payload: &[u8],
        observer: &mut O,
    ) -> Result<(), UploadError<T::Error>> {
        self.checkpoint(observer)?;

        let frame = encode(cmd, addr, payload)?;
        debug!("sending {} frame", self.state);
        self.transport.write(&frame).map_err(|e| self.io(e))?;

        let timeout = self.profile.frame_ack_timeout_ms;
        match read_ack_frame(&mut *self.transport, &*self.timer, timeout).map_err(|e| self.io(e))? {
            AckRead::Frame { frame, raw } => {
                if !AckShape::classify(&frame).acks_control(cmd) {
                    warn!("unexpected ACK during {}: {:?}", self.state, raw.as_slice());
                    return Err(self.protocol(ProtocolError::UnexpectedAck {
                        state: self.state,
                        received: raw,
                    }));
                }
            }
            AckRead::Silent { raw } => {
                warn!("no ACK frame during {}", self.state);
                return Err(self.protocol(ProtocolError::MalformedFrame {
                    state: self.state,
                    received: raw,
                }));
            }
        }

        self.advance(SessionEvent::FrameAcked, observer);
        Ok(())
    }

    /// Write every chunk; returns (frames, image bytes)
    fn transfer<O: UploadObserver>(
        &mut self,
        settings: &UploadSettings,
        chunk_size: NonZeroUsize,
        image: &[u8],
        observer: &mut O,
    ) -> Result<(usize, usize), UploadError<T::Error>> {
        let total = image.len();
        let chunks = chunk(image, chunk_size, settings.pad_last_chunk).map_err(UploadError::Frame)?;
        info!("writing {} bytes in {} chunks", total, chunks.len());
        observer.on_progress(0, total);

        let mut frames = 0;
        let mut sent = 0;
        let timeout = self.profile.chunk_ack_timeout_ms;

        for c in chunks {
            // Setup already polled for cancellation before the first chunk
            if frames > 0 {
                self.checkpoint(observer)?;
            }

            let address = calc_address(c.offset, chunk_size, settings.address_mode);
            let address = u16::try_from(address).map_err(|_| {
                UploadError::Plan(PlanError::AddressOverflow {
                    offset: c.offset,
                    address,
                })
            })?;

            let frame = encode(Command::Write, address, c.data())?;
            self.transport.write(&frame).map_err(|e| self.io(e))?;
            frames += 1;

            let acked = match read_ack_frame(&mut *self.transport, &*self.timer, timeout)
                .map_err(|e| self.io(e))?
            {
                AckRead::Frame { frame, raw } => {
                    if AckShape::classify(&frame).acks_data() {
                        Ok(())
                    } else {
                        Err(raw)
                    }
                }
                AckRead::Silent { raw } => Err(raw),
            };

            if let Err(received) = acked {
                error!(
                    "chunk at offset {} (address {}) not acknowledged",
                    c.offset, address
                );
                return Err(UploadError::ChunkWriteFailed {
                    offset: c.offset,
                    address,
                    attempt: self.attempt,
                    received,
                });
            }

            sent += c.source_len(total);
            trace!("chunk {} acked, {}/{} bytes", frames, sent, total);
            observer.on_progress(sent, total);
        }

        self.advance(SessionEvent::ChunksDone, observer);
        Ok((frames, sent))
    }

    /// Send the completion frame; a silent radio is not an error
    fn complete<O: UploadObserver>(
        &mut self,
        observer: &mut O,
    ) -> Result<Option<u8>, UploadError<T::Error>> {
        let stale = self.discard_pending()?;
        if stale > 0 {
            trace!("discarded {} stale bytes before completion", stale);
        }

        let frame = encode(Command::Complete, 0, COMPLETE_PAYLOAD)?;
        self.transport.write(&frame).map_err(|e| self.io(e))?;

        let mut buf = [0u8; 16];
        let n = self
            .transport
            .read_at_most(&mut buf, self.profile.completion_timeout_ms)
            .map_err(|e| self.io(e))?;
        let response = buf[..n].first().copied();

        match response {
            None => debug!("no completion response"),
            Some(COMPLETE_OK) => debug!("completion acknowledged"),
            Some(byte) => note!(
                observer,
                warn,
                "unexpected completion response {:#x}, logo data was sent",
                byte
            ),
        }

        self.advance(SessionEvent::Committed, observer);
        Ok(response)
    }
}

pub(super) fn encode<E>(
    cmd: Command,
    addr: u16,
    payload: &[u8],
) -> Result<heapless::Vec<u8, MAX_FRAME_SIZE>, UploadError<E>> {
    build_frame(cmd.as_byte(), addr, payload).map_err(UploadError::Frame)
}
