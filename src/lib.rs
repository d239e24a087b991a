//! Longan - document-properties interchange and creation gateway
//!
//! Longan sits between a host language and a native Office document engine.
//! It does not read or write OOXML itself; it defines how a host describes a
//! document it wants created and how the resulting engine object is handed
//! back and later saved and released.
//!
//! # Features
//!
//! - **Properties Encoder**: flatbuffers-compatible, table-encoded properties
//!   buffers that grow by appending fields without breaking old readers
//! - **Creation Gateway**: validated `create` / `save_as` / `release` over a
//!   pluggable [`DocumentEngine`](gateway::DocumentEngine)
//! - **Owned handles**: generational handles that detect double release and
//!   use-after-release instead of crashing
//! - **C ABI**: `longan_*` functions for hosts that load the library
//!   dynamically
//!
//! # Example
//!
//! ```
//! use longan::DocumentKind;
//! use longan::gateway::{CreationGateway, CreationRequest, LoopbackEngine};
//! use longan::properties::{self, DocumentPropertiesModel};
//!
//! # fn main() -> longan::Result<()> {
//! let buffer = properties::encode(DocumentKind::Word, &DocumentPropertiesModel::in_memory())?;
//!
//! let gateway = CreationGateway::new(LoopbackEngine);
//! let path = std::env::temp_dir().join("longan-letter.docx");
//! let request = CreationRequest::new(DocumentKind::Word, path.to_string_lossy(), buffer);
//! let handle = gateway.create(request)?;
//! gateway.save_as(&handle, &path)?;
//! gateway.release(handle)?;
//! # Ok(())
//! # }
//! ```

/// Shared error type, document kinds and binary helpers
pub mod common;

/// Table-encoded document properties
pub mod properties;

/// Creation protocol, handles and engine seam
pub mod gateway;

/// C ABI over the process-wide gateway
pub mod ffi;

// Re-export commonly used types for convenience
pub use common::{DocumentKind, Error, Result};
pub use gateway::{CreationGateway, CreationRequest, DocumentHandle};
pub use properties::{CoreProperties, DocumentPropertiesModel};
