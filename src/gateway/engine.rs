//! The seam between the gateway and a document engine.
//!
//! The engine owns everything about the document itself (package layout,
//! XML parts, saving). The gateway only hands it a decoded properties model
//! plus the raw buffer, and keeps the returned document behind a handle.

use std::fmt;
use std::path::Path;

use crate::common::DocumentKind;
use crate::properties::DocumentPropertiesModel;

/// Concurrency guarantee an engine makes about its documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadSafety {
    /// Calls must not overlap at all; the gateway serializes them.
    #[default]
    Serialized,
    /// Calls on different handles may run concurrently.
    IndependentHandles,
}

/// Everything an engine gets for a `create` call.
#[derive(Debug, Clone, Copy)]
pub struct CreateSpec<'a> {
    pub kind: DocumentKind,
    pub file_name: &'a str,
    pub properties: &'a DocumentPropertiesModel,
    /// The encoded buffer exactly as the caller sent it.
    pub raw_properties: &'a [u8],
}

/// Failure reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineFailure {
    /// The engine ran and refused the request.
    Rejected(String),
    /// The engine could not be reached or is not operational.
    Unavailable(String),
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineFailure::Rejected(msg) | EngineFailure::Unavailable(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for EngineFailure {}

impl From<std::io::Error> for EngineFailure {
    fn from(err: std::io::Error) -> Self {
        EngineFailure::Rejected(err.to_string())
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineFailure>;

/// A document living inside an engine.
pub trait EngineDocument: Send {
    /// Kind of document the engine actually created. A document whose kind
    /// differs from the request is closed and the create fails.
    fn kind(&self) -> DocumentKind;

    /// Persist the document to `destination`.
    fn save_as(&mut self, destination: &Path) -> EngineResult<()>;

    /// Give the document back to the engine. Called exactly once.
    fn close(self: Box<Self>) -> EngineResult<()> {
        Ok(())
    }
}

/// A document engine the gateway can create documents with.
pub trait DocumentEngine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn thread_safety(&self) -> ThreadSafety {
        ThreadSafety::Serialized
    }

    fn create(&self, spec: &CreateSpec<'_>) -> EngineResult<Box<dyn EngineDocument>>;
}

/// Engine placeholder that reports itself unavailable.
///
/// Installed by default, so a host that forgets to install an engine gets a
/// transport error instead of a crash.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableEngine;

impl DocumentEngine for UnavailableEngine {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn thread_safety(&self) -> ThreadSafety {
        ThreadSafety::IndependentHandles
    }

    fn create(&self, _spec: &CreateSpec<'_>) -> EngineResult<Box<dyn EngineDocument>> {
        Err(EngineFailure::Unavailable(
            "no document engine installed".to_string(),
        ))
    }
}
