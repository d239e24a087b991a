//! Common types and utilities shared by the encoder, the gateway and the
//! foreign-function surfaces.

// Submodule declarations
pub mod binary;
pub mod error;
pub mod kind;

// Re-exports for convenience
pub use error::{Error, Result};
pub use kind::DocumentKind;
