use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

use crate::decode::DecodeError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("timed out connecting to {addr} after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("failed to read from server: {0}")]
    Receive(#[source] io::Error),

    #[error("{0}")]
    Decode(#[from] DecodeError),

    #[error("failed to send to server: {0}")]
    Transmit(#[from] LinesCodecError),

    #[error("failed to read input: {0}")]
    Input(#[source] io::Error),

    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

impl ClientError {
    /// Whether the session can keep going after reporting this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ClientError::Decode(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
