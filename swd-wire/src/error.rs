use thiserror::Error;

use crate::{
    ack::AckCode,
    protocol::{PortType, RegisterAddress},
};

/// Failure of the physical transport.
///
/// The engine never interprets these, it only hands them back to the caller.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error on the debug transport")]
    Io(#[from] std::io::Error),
    #[error("Debug transport timed out")]
    Timeout,
    #[error("Transport returned {actual} bits for a sequence of {expected} bits")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Transport specific error")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    pub fn other(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Other(Box::new(e))
    }
}

/// Errors returned by [`SwdEngine`](crate::SwdEngine) transactions.
#[derive(Error, Debug)]
pub enum SwdError {
    #[error("An error occurred in the transport between host and target")]
    Transport(#[from] TransportError),
    #[error("Target responded with {0} to request")]
    Acknowledge(AckCode),
    #[error("Incorrect parity on read of value {value:#010x}")]
    IncorrectParity { value: u32 },
    #[error("Write transaction to {0:?} register {1} has no value")]
    MissingWriteValue(PortType, RegisterAddress),
}

impl SwdError {
    /// The acknowledge that caused this error, if any.
    pub fn ack(&self) -> Option<AckCode> {
        match self {
            SwdError::Acknowledge(ack) => Some(*ack),
            _ => None,
        }
    }
}

impl From<AckCode> for SwdError {
    fn from(ack: AckCode) -> Self {
        SwdError::Acknowledge(ack)
    }
}
