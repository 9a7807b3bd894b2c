//! `serialport`-backed transport
//!
//! The port is opened lazily by [`Transport::open`] and dropped on
//! [`Transport::close`]. Bytes handed back through [`Transport::unread`]
//! are served before anything new from the line.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use log::{debug, info, trace};
use radiologo_hal::{ControlSignals, DataBits, Parity, SerialConfig, StopBits, Transport};
use serialport::{ClearBuffer, FlowControl, SerialPort};

use crate::error::SerialError;

/// Read timeout used until the first bounded read
const OPEN_TIMEOUT: Duration = Duration::from_millis(100);

/// Names of the serial ports present on this machine
pub fn list_ports() -> Result<Vec<String>, SerialError> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}

/// Transport over a named serial device
pub struct SerialPortTransport {
    path: String,
    port: Option<Box<dyn SerialPort>>,
    pushback: VecDeque<u8>,
}

impl SerialPortTransport {
    /// Transport for `path`; nothing is opened yet
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            port: None,
            pushback: VecDeque::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, SerialError> {
        self.port.as_mut().ok_or(SerialError::NotOpen)
    }

    fn take_pushback(&mut self, buf: &mut [u8]) -> usize {
        let n = self.pushback.len().min(buf.len());
        for (dst, src) in buf.iter_mut().zip(self.pushback.drain(..n)) {
            *dst = src;
        }
        n
    }
}

impl Drop for SerialPortTransport {
    fn drop(&mut self) {
        self.close();
    }
}

fn data_bits(bits: DataBits) -> serialport::DataBits {
    match bits {
        DataBits::Seven => serialport::DataBits::Seven,
        DataBits::Eight => serialport::DataBits::Eight,
    }
}

fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Even => serialport::Parity::Even,
        Parity::Odd => serialport::Parity::Odd,
    }
}

fn stop_bits(bits: StopBits) -> serialport::StopBits {
    match bits {
        StopBits::One => serialport::StopBits::One,
        StopBits::Two => serialport::StopBits::Two,
    }
}

impl Transport for SerialPortTransport {
    type Error = SerialError;

    fn open(&mut self, config: &SerialConfig) -> Result<(), SerialError> {
        self.close();

        let mut port = serialport::new(self.path.as_str(), config.baudrate)
            .data_bits(data_bits(config.data_bits))
            .parity(parity(config.parity))
            .stop_bits(stop_bits(config.stop_bits))
            .flow_control(FlowControl::None)
            .timeout(OPEN_TIMEOUT)
            .open()
            .map_err(|source| SerialError::Open {
                path: self.path.clone(),
                source,
            })?;
        port.clear(ClearBuffer::All)?;

        info!("opened {} at {} baud", self.path, config.baudrate);
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        self.pushback.clear();
        if self.port.take().is_some() {
            debug!("closed {}", self.path);
        }
    }

    fn set_signals(&mut self, signals: ControlSignals) -> Result<(), SerialError> {
        let port = self.port_mut()?;
        port.write_data_terminal_ready(signals.dtr)?;
        port.write_request_to_send(signals.rts)?;
        trace!("DTR={} RTS={}", signals.dtr, signals.rts);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), SerialError> {
        let port = self.port_mut()?;
        port.write_all(data)?;
        port.flush()?;
        trace!("TX {} bytes: {:02X?}", data.len(), &data[..data.len().min(16)]);
        Ok(())
    }

    fn read_at_most(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, SerialError> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.pushback.is_empty() {
            return Ok(self.take_pushback(buf));
        }

        let port = self.port_mut()?;
        port.set_timeout(Duration::from_millis(u64::from(timeout_ms.max(1))))?;
        match port.read(buf) {
            Ok(n) => {
                if n > 0 {
                    trace!("RX {} bytes: {:02X?}", n, &buf[..n.min(16)]);
                }
                Ok(n)
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn unread(&mut self, data: &[u8]) {
        for &byte in data.iter().rev() {
            self.pushback.push_front(byte);
        }
    }
}
