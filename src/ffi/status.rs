//! Status codes returned across the C ABI.

use std::ffi::{CStr, c_char};

use crate::common::Error;

/// Result of every `longan_*` call that can fail.
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    UnknownError = -1,
    Success = 0,
    InvalidArgument = 1,
    EncodingError = 2,
    EngineError = 3,
    TransportError = 4,
    InvalidHandle = 5,
    DecodeError = 6,
}

impl StatusCode {
    pub fn from_code(code: i8) -> Option<Self> {
        Some(match code {
            -1 => StatusCode::UnknownError,
            0 => StatusCode::Success,
            1 => StatusCode::InvalidArgument,
            2 => StatusCode::EncodingError,
            3 => StatusCode::EngineError,
            4 => StatusCode::TransportError,
            5 => StatusCode::InvalidHandle,
            6 => StatusCode::DecodeError,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static CStr {
        match self {
            StatusCode::UnknownError => c"UnknownError",
            StatusCode::Success => c"Success",
            StatusCode::InvalidArgument => c"InvalidArgument",
            StatusCode::EncodingError => c"EncodingError",
            StatusCode::EngineError => c"EngineError",
            StatusCode::TransportError => c"TransportError",
            StatusCode::InvalidHandle => c"InvalidHandle",
            StatusCode::DecodeError => c"DecodeError",
        }
    }
}

impl From<&Error> for StatusCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidArgument(_) | Error::Config(_) => StatusCode::InvalidArgument,
            Error::Encoding(_) => StatusCode::EncodingError,
            Error::Decode(_) | Error::KindMismatch { .. } => StatusCode::DecodeError,
            Error::Engine(_) => StatusCode::EngineError,
            Error::Transport(_) => StatusCode::TransportError,
            Error::InvalidHandle(_) => StatusCode::InvalidHandle,
            Error::Io(_) => StatusCode::UnknownError,
        }
    }
}

/// Static, NUL-terminated name of a status code. Never freed by the caller.
#[unsafe(no_mangle)]
pub extern "C" fn longan_status_name(code: i8) -> *const c_char {
    StatusCode::from_code(code)
        .unwrap_or(StatusCode::UnknownError)
        .name()
        .as_ptr()
}
