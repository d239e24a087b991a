//! Creation Gateway.
//!
//! Turns a file name plus an encoded properties buffer into a document
//! living inside a [`DocumentEngine`], and hands the caller back an owned
//! [`DocumentHandle`].
//!
//! # Example
//!
//! ```
//! use longan::DocumentKind;
//! use longan::gateway::{CreationGateway, CreationRequest, LoopbackEngine};
//! use longan::properties::DocumentPropertiesModel;
//!
//! # fn main() -> longan::Result<()> {
//! let dir = std::env::temp_dir();
//! let gateway = CreationGateway::new(LoopbackEngine);
//!
//! let request = CreationRequest::from_properties(
//!     DocumentKind::Spreadsheet,
//!     dir.join("book1.xlsx").to_string_lossy(),
//!     &DocumentPropertiesModel::in_memory(),
//! )?;
//! let handle = gateway.create(request)?;
//! gateway.save_as(&handle, dir.join("book1-copy.xlsx"))?;
//! gateway.release(handle)?;
//! # Ok(())
//! # }
//! ```

// Submodule declarations
pub mod config;
pub mod creation;
pub mod engine;
pub mod global;
pub mod handle;
pub mod loopback;
pub mod request;

// Re-exports
pub use config::GatewayConfig;
pub use creation::{CreationGateway, CreationResult};
pub use engine::{
    CreateSpec, DocumentEngine, EngineDocument, EngineFailure, EngineResult, ThreadSafety,
    UnavailableEngine,
};
pub use handle::{DocumentHandle, HandleTable};
pub use loopback::LoopbackEngine;
pub use request::CreationRequest;
