//! Serial transport abstraction
//!
//! The upload session owns exactly one transport for its lifetime. Reads
//! are bounded by a timeout and never block forever; bytes that a parser
//! over-read can be handed back with [`Transport::unread`].

/// Serial link consumed by the upload session
pub trait Transport {
    /// Error type for I/O operations
    type Error: core::fmt::Debug;

    /// Open the link with the given line configuration
    fn open(&mut self, config: &SerialConfig) -> Result<(), Self::Error>;

    /// Close the link
    ///
    /// Must be idempotent: closing an already closed transport is a no-op.
    fn close(&mut self);

    /// Drive the DTR/RTS modem lines
    fn set_signals(&mut self, signals: ControlSignals) -> Result<(), Self::Error>;

    /// Write all bytes and flush
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Read whatever is available, waiting up to `timeout_ms` for the first byte
    ///
    /// Returns `Ok(0)` on timeout. Pushed-back bytes are returned before any
    /// new line data. A zero timeout only returns bytes already buffered.
    fn read_at_most(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    /// Fill `buf`, waiting up to `timeout_ms` for each read
    ///
    /// Returns the number of bytes read; a short count means the line went
    /// quiet before `buf` was full.
    fn read_exact(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at_most(&mut buf[filled..], timeout_ms)?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Push bytes back so the next read returns them first
    fn unread(&mut self, data: &[u8]);
}

/// DTR/RTS modem line levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlSignals {
    pub dtr: bool,
    pub rts: bool,
}

impl ControlSignals {
    /// Both lines asserted
    pub const HIGH: Self = Self {
        dtr: true,
        rts: true,
    };

    /// Both lines released
    pub const LOW: Self = Self {
        dtr: false,
        rts: false,
    };
}

/// Serial line configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl SerialConfig {
    /// 8N1 at the given baud rate
    pub const fn with_baudrate(baudrate: u32) -> Self {
        Self {
            baudrate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::with_baudrate(115_200)
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopBits {
    One,
    Two,
}
