//! Unified error types for longan.
//!
//! This module provides a single error type shared by the properties
//! encoder, the creation gateway and the C ABI.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
