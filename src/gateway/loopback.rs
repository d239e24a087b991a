//! In-process stand-in for a native document engine.
//!
//! The loopback engine knows nothing about OOXML. It stages a document's
//! bytes and writes them back out on `save_as`, which is enough to drive
//! the full create/save/release protocol from tests and from hosts that
//! have no native engine available:
//!
//! - in-memory documents hold the source file's bytes, or start empty when
//!   the source does not exist yet;
//! - on-disk documents use the source file as their working copy, creating
//!   it when missing, and copy it on `save_as`.
//!
//! Documents opened with `is_editable: false` refuse to overwrite their
//! source.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::engine::{
    CreateSpec, DocumentEngine, EngineDocument, EngineFailure, EngineResult, ThreadSafety,
};
use crate::common::DocumentKind;

/// See the [module documentation](self).
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopbackEngine;

impl LoopbackEngine {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug)]
enum Staging {
    Memory(Vec<u8>),
    Disk(PathBuf),
}

/// A document staged by [`LoopbackEngine`].
#[derive(Debug)]
struct LoopbackDocument {
    kind: DocumentKind,
    source: PathBuf,
    editable: bool,
    staging: Staging,
}

impl DocumentEngine for LoopbackEngine {
    fn name(&self) -> &str {
        "loopback"
    }

    fn thread_safety(&self) -> ThreadSafety {
        ThreadSafety::IndependentHandles
    }

    fn create(&self, spec: &CreateSpec<'_>) -> EngineResult<Box<dyn EngineDocument>> {
        let source = PathBuf::from(spec.file_name);
        let staging = if spec.properties.is_in_memory {
            match fs::read(&source) {
                Ok(bytes) => Staging::Memory(bytes),
                Err(e) if e.kind() == ErrorKind::NotFound => Staging::Memory(Vec::new()),
                Err(e) => return Err(rejected("read", &source, e)),
            }
        } else {
            if !source.exists() {
                if !spec.properties.is_editable {
                    return Err(EngineFailure::Rejected(format!(
                        "Cannot open missing file {} read-only",
                        source.display()
                    )));
                }
                fs::File::create(&source).map_err(|e| rejected("create", &source, e))?;
            }
            Staging::Disk(source.clone())
        };

        Ok(Box::new(LoopbackDocument {
            kind: spec.kind,
            source,
            editable: spec.properties.is_editable,
            staging,
        }))
    }
}

impl EngineDocument for LoopbackDocument {
    fn kind(&self) -> DocumentKind {
        self.kind
    }

    fn save_as(&mut self, destination: &Path) -> EngineResult<()> {
        if !self.editable && same_file(&self.source, destination) {
            return Err(EngineFailure::Rejected(format!(
                "{} was opened read-only and cannot be overwritten",
                self.source.display()
            )));
        }
        match &self.staging {
            Staging::Memory(bytes) => {
                fs::write(destination, bytes).map_err(|e| rejected("write", destination, e))
            },
            Staging::Disk(working) => {
                if same_file(working, destination) {
                    return Ok(());
                }
                fs::copy(working, destination)
                    .map(|_| ())
                    .map_err(|e| rejected("copy to", destination, e))
            },
        }
    }
}

fn rejected(action: &str, path: &Path, err: std::io::Error) -> EngineFailure {
    EngineFailure::Rejected(format!("Failed to {} {}: {}", action, path.display(), err))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use crate::gateway::{CreationGateway, CreationRequest, DocumentHandle};
    use crate::properties::DocumentPropertiesModel;

    fn create(
        gateway: &CreationGateway,
        path: &Path,
        properties: &DocumentPropertiesModel,
    ) -> crate::Result<DocumentHandle> {
        let request = CreationRequest::from_properties(
            DocumentKind::Spreadsheet,
            path.to_string_lossy(),
            properties,
        )?;
        gateway.create(request)
    }

    #[test]
    fn test_in_memory_new_document() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = CreationGateway::new(LoopbackEngine);
        let source = dir.path().join("book1.xlsx");

        let handle = create(&gateway, &source, &DocumentPropertiesModel::in_memory()).unwrap();
        assert!(!source.exists(), "in-memory documents do not touch the source");

        gateway.save_as(&handle, &source).unwrap();
        assert!(source.exists());
        assert_eq!(fs::read(&source).unwrap(), b"");

        let raw = handle.as_raw();
        gateway.release(handle).unwrap();
        assert!(matches!(
            gateway.save_as(&DocumentHandle::from_raw(raw), dir.path().join("x")),
            Err(Error::InvalidHandle(_))
        ));
    }

    #[test]
    fn test_in_memory_copies_existing_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("template.xlsx");
        fs::write(&source, b"PK\x03\x04template").unwrap();

        let gateway = CreationGateway::new(LoopbackEngine);
        let handle = create(&gateway, &source, &DocumentPropertiesModel::in_memory()).unwrap();

        // changing the source afterwards does not affect the staged copy
        fs::write(&source, b"changed").unwrap();
        let out = dir.path().join("out.xlsx");
        gateway.save_as(&handle, &out).unwrap();
        assert_eq!(fs::read(&out).unwrap(), b"PK\x03\x04template");
        gateway.release(handle).unwrap();
    }

    #[test]
    fn test_on_disk_document_creates_working_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.xlsx");
        let gateway = CreationGateway::new(LoopbackEngine);

        let handle = create(&gateway, &source, &DocumentPropertiesModel::default()).unwrap();
        assert!(source.exists());

        fs::write(&source, b"edited in place").unwrap();
        let copy = dir.path().join("copy.xlsx");
        gateway.save_as(&handle, &copy).unwrap();
        assert_eq!(fs::read(&copy).unwrap(), b"edited in place");
        // saving onto itself is a no-op
        gateway.save_as(&handle, &source).unwrap();
        gateway.release(handle).unwrap();
    }

    #[test]
    fn test_read_only_document() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = CreationGateway::new(LoopbackEngine);
        let read_only = DocumentPropertiesModel::default().with_editable(false);

        let missing = dir.path().join("missing.xlsx");
        assert!(matches!(
            create(&gateway, &missing, &read_only),
            Err(Error::Engine(_))
        ));

        let source = dir.path().join("locked.xlsx");
        fs::write(&source, b"data").unwrap();
        let handle = create(&gateway, &source, &read_only).unwrap();
        assert!(matches!(gateway.save_as(&handle, &source), Err(Error::Engine(_))));
        gateway
            .save_as(&handle, dir.path().join("unlocked.xlsx"))
            .unwrap();
        gateway.release(handle).unwrap();
    }

    #[test]
    fn test_write_failure_is_engine_error_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = CreationGateway::new(LoopbackEngine);
        let handle = create(
            &gateway,
            &dir.path().join("a.xlsx"),
            &DocumentPropertiesModel::in_memory(),
        )
        .unwrap();

        let bad = dir.path().join("no-such-dir").join("a.xlsx");
        match gateway.save_as(&handle, &bad) {
            Err(Error::Engine(message)) => assert!(message.contains("no-such-dir")),
            other => panic!("expected engine error, got {:?}", other),
        }
        gateway.release(handle).unwrap();
    }
}
