//! Serial backend errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerialError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },

    #[error("serial port is not open")]
    NotOpen,

    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),

    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}
