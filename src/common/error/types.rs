//! Unified error types for the longan gateway.
//!
//! Every failure the encoder, the gateway and the C ABI can report is one of
//! these variants. Engine messages are carried verbatim.
use thiserror::Error;

use crate::common::DocumentKind;

/// Main error type for longan operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed request detected before the engine was reached
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The properties buffer could not be built
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The properties buffer could not be read back
    #[error("Decode error: {0}")]
    Decode(String),

    /// The buffer carries the file identifier of another document kind
    #[error("Kind mismatch: expected {expected} properties, buffer is tagged {found}")]
    KindMismatch {
        expected: DocumentKind,
        found: DocumentKind,
    },

    /// The engine rejected the request; the message is the engine's own
    #[error("{0}")]
    Engine(String),

    /// The call into the engine could not be completed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The handle was never issued, or has already been released
    #[error("Invalid handle: {0:#x}")]
    InvalidHandle(u64),

    /// Configuration could not be loaded or stored
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a caller can reasonably correct its input and try again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_)
                | Error::Decode(_)
                | Error::KindMismatch { .. }
                | Error::Engine(_)
                | Error::InvalidHandle(_)
        )
    }
}

/// Result type for longan operations.
pub type Result<T> = std::result::Result<T, Error>;
