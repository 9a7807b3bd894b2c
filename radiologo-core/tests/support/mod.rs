//! Scripted radio and fake clock for upload tests
#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use radiologo_core::{SessionState, UploadObserver};
use radiologo_hal::{ControlSignals, SerialConfig, Timer, Transport};
use radiologo_protocol::commands::{HANDSHAKE_ACK, HANDSHAKE_MAGIC, MODE_SWITCH};
use radiologo_protocol::{build_frame, parse_response, FRAME_START};

/// Shared millisecond clock; clones see the same time
#[derive(Debug, Clone, Default)]
pub struct FakeClock(Rc<Cell<u64>>);

impl FakeClock {
    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Timer for FakeClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

/// Line noise with no start byte
pub const GARBAGE: [u8; 4] = [0x13, 0x37, 0x00, 0xFF];

/// Everything the uploader did to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open(u32),
    Close,
    Signals(ControlSignals),
    Write(Vec<u8>),
    Unread(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptError {
    OpenFailed,
    NotOpen,
    WriteFailed,
}

/// Which data ACK the radio answers with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStyle {
    /// Dedicated 0xEE frame
    DataAck,
    /// Write opcode echoed with 'Y'
    Echo,
}

/// Simulated radio behind an in-memory serial line
pub struct FakeRadio {
    clock: FakeClock,
    incoming: VecDeque<Vec<u8>>,
    pushed_back: Vec<u8>,
    open: bool,
    sessions: u8,
    pulsed: bool,
    chunks_seen: usize,
    writes: usize,
    /// Timestamped transport calls
    pub events: Vec<(u64, Event)>,
    /// Bytes queued right after open
    pub boot_noise: Vec<u8>,
    /// Sessions whose handshake is never answered
    pub silent_sessions: u8,
    /// Only answer the handshake after a DTR/RTS pulse
    pub needs_pulse: bool,
    /// Sessions whose setup frame gets a NAK
    pub nak_setup_sessions: u8,
    /// Zero-based data chunk that gets a NAK frame
    pub fail_chunk: Option<usize>,
    /// Zero-based data chunk answered with bytes that are not a frame
    pub garble_chunk: Option<usize>,
    /// Sessions whose setup frame is answered with bytes that are not a frame
    pub garble_setup_sessions: u8,
    /// Zero-based write index that fails with an I/O error
    pub fail_write: Option<usize>,
    pub ack_style: AckStyle,
    /// Deliver each reply as noise plus two fragments with a trailing byte
    pub split_replies: bool,
    /// Reply to the completion frame
    pub completion: Option<u8>,
}

impl FakeRadio {
    pub fn new(clock: &FakeClock) -> Self {
        Self {
            clock: clock.clone(),
            incoming: VecDeque::new(),
            pushed_back: Vec::new(),
            open: false,
            sessions: 0,
            pulsed: false,
            chunks_seen: 0,
            writes: 0,
            events: Vec::new(),
            boot_noise: Vec::new(),
            silent_sessions: 0,
            needs_pulse: false,
            nak_setup_sessions: 0,
            fail_chunk: None,
            garble_chunk: None,
            garble_setup_sessions: 0,
            fail_write: None,
            ack_style: AckStyle::DataAck,
            split_replies: false,
            completion: Some(0x00),
        }
    }

    pub fn writes(&self) -> Vec<&[u8]> {
        self.events
            .iter()
            .filter_map(|(_, e)| match e {
                Event::Write(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .collect()
    }

    /// Data-write frames in order
    pub fn data_writes(&self) -> Vec<&[u8]> {
        self.writes()
            .into_iter()
            .filter(|w| w.len() > 1 && w[0] == FRAME_START && w[1] == 0x57)
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|(_, e)| pred(e)).count()
    }

    pub fn opens(&self) -> usize {
        self.count(|e| matches!(e, Event::Open(_)))
    }

    pub fn closes(&self) -> usize {
        self.count(|e| matches!(e, Event::Close))
    }

    pub fn last_event(&self) -> Option<&Event> {
        self.events.last().map(|(_, e)| e)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Time of the n-th event matching `pred`
    pub fn time_of(&self, n: usize, pred: impl Fn(&Event) -> bool) -> Option<u64> {
        self.events
            .iter()
            .filter(|(_, e)| pred(e))
            .nth(n)
            .map(|(t, _)| *t)
    }

    fn record(&mut self, event: Event) {
        self.events.push((self.clock.now_ms(), event));
    }

    fn reply(&mut self, bytes: Vec<u8>) {
        if self.split_replies && bytes.len() > 3 {
            let mut tail = bytes[3..].to_vec();
            tail.push(0x55);
            self.incoming.push_back(vec![0x00, 0x13]);
            self.incoming.push_back(bytes[..3].to_vec());
            self.incoming.push_back(tail);
        } else {
            self.incoming.push_back(bytes);
        }
    }

    fn respond(&mut self, data: &[u8]) {
        if data == HANDSHAKE_MAGIC {
            let silent = self.sessions <= self.silent_sessions;
            if !silent && (!self.needs_pulse || self.pulsed) {
                self.reply(vec![0x00, 0x7F, HANDSHAKE_ACK]);
            }
            return;
        }
        if data == [MODE_SWITCH] {
            return;
        }

        let Ok(frame) = parse_response(data) else {
            return;
        };
        let reply = match frame.cmd {
            0x03 if self.sessions <= self.garble_setup_sessions => {
                self.incoming.push_back(GARBAGE.to_vec());
                return;
            }
            0x03 if self.sessions <= self.nak_setup_sessions => build_frame(0x03, 0, b"N"),
            0x02 | 0x03 | 0x04 => build_frame(frame.cmd, 0, b"Y"),
            0x57 => {
                let index = self.chunks_seen;
                self.chunks_seen += 1;
                if self.garble_chunk == Some(index) {
                    self.incoming.push_back(GARBAGE.to_vec());
                    return;
                }
                if self.fail_chunk == Some(index) {
                    build_frame(0x57, frame.addr, b"N")
                } else {
                    match self.ack_style {
                        AckStyle::DataAck => build_frame(0xEE, 0, &[]),
                        AckStyle::Echo => build_frame(0x57, frame.addr, b"Y"),
                    }
                }
            }
            0x06 => {
                if let Some(byte) = self.completion {
                    self.incoming.push_back(vec![byte]);
                }
                return;
            }
            _ => return,
        };
        let reply = reply.expect("reply frame fits");
        self.reply(reply.to_vec());
    }
}

impl Transport for FakeRadio {
    type Error = ScriptError;

    fn open(&mut self, config: &SerialConfig) -> Result<(), ScriptError> {
        self.record(Event::Open(config.baudrate));
        self.open = true;
        self.sessions += 1;
        self.pulsed = false;
        if !self.boot_noise.is_empty() {
            self.incoming.push_back(self.boot_noise.clone());
        }
        Ok(())
    }

    fn close(&mut self) {
        self.record(Event::Close);
        self.open = false;
        self.incoming.clear();
        self.pushed_back.clear();
    }

    fn set_signals(&mut self, signals: ControlSignals) -> Result<(), ScriptError> {
        if !self.open {
            return Err(ScriptError::NotOpen);
        }
        self.record(Event::Signals(signals));
        if !signals.dtr {
            self.pulsed = true;
        }
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        if !self.open {
            return Err(ScriptError::NotOpen);
        }
        let index = self.writes;
        self.writes += 1;
        if self.fail_write == Some(index) {
            return Err(ScriptError::WriteFailed);
        }
        self.record(Event::Write(data.to_vec()));
        self.respond(data);
        Ok(())
    }

    fn read_at_most(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, ScriptError> {
        if !self.open {
            return Err(ScriptError::NotOpen);
        }
        let mut source = if !self.pushed_back.is_empty() {
            std::mem::take(&mut self.pushed_back)
        } else if let Some(chunk) = self.incoming.pop_front() {
            chunk
        } else {
            self.clock.advance(u64::from(timeout_ms));
            return Ok(0);
        };

        let n = source.len().min(buf.len());
        buf[..n].copy_from_slice(&source[..n]);
        if n < source.len() {
            self.incoming.push_front(source.split_off(n));
        }
        Ok(n)
    }

    fn unread(&mut self, data: &[u8]) {
        self.record(Event::Unread(data.to_vec()));
        let mut joined = data.to_vec();
        joined.append(&mut self.pushed_back);
        self.pushed_back = joined;
    }
}

/// Observer that records everything and can cancel on the n-th poll
#[derive(Default)]
pub struct Recorder {
    pub states: Vec<(SessionState, u8)>,
    pub progress: Vec<(usize, usize)>,
    pub logs: Vec<String>,
    pub frames: Vec<Vec<u8>>,
    pub polls: usize,
    pub cancel_on_poll: Option<usize>,
}

impl Recorder {
    pub fn cancelling_on(poll: usize) -> Self {
        Self {
            cancel_on_poll: Some(poll),
            ..Self::default()
        }
    }

    pub fn logged(&self, needle: &str) -> bool {
        self.logs.iter().any(|l| l.contains(needle))
    }
}

impl UploadObserver for Recorder {
    fn on_state(&mut self, state: SessionState, attempt: u8) {
        self.states.push((state, attempt));
    }

    fn on_progress(&mut self, sent: usize, total: usize) {
        self.progress.push((sent, total));
    }

    fn on_log(&mut self, line: fmt::Arguments<'_>) {
        self.logs.push(line.to_string());
    }

    fn on_frame(&mut self, bytes: &[u8]) {
        self.frames.push(bytes.to_vec());
    }

    fn cancel_requested(&mut self) -> bool {
        self.polls += 1;
        self.cancel_on_poll.is_some_and(|n| self.polls >= n)
    }
}

/// Test image with a recognisable byte pattern
pub fn logo() -> Vec<u8> {
    (0..40960u32).map(|i| (i % 251) as u8).collect()
}
