//! The creation gateway.
//!
//! [`CreationGateway`] validates requests, decodes the properties buffer,
//! forwards the call to the installed [`DocumentEngine`] and keeps the
//! resulting document behind a [`DocumentHandle`] until it is released.

use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use super::config::GatewayConfig;
use super::engine::{
    CreateSpec, DocumentEngine, EngineDocument, EngineFailure, EngineResult, ThreadSafety,
};
use super::handle::{DocumentHandle, HandleTable};
use super::request::CreationRequest;
use crate::common::{DocumentKind, Error, Result};
use crate::properties;

/// Outcome of [`CreationGateway::create`]: a handle or an error, never both.
pub type CreationResult = Result<DocumentHandle>;

/// `None` once the document has been closed.
type DocumentCell = Arc<Mutex<Option<Box<dyn EngineDocument>>>>;

struct OpenDocument {
    kind: DocumentKind,
    cell: DocumentCell,
}

/// Turns creation requests into engine documents and tracks their handles.
///
/// The gateway is `Send + Sync`. Calls on different handles only contend on
/// the engine when it declares [`ThreadSafety::Serialized`] or the
/// configuration forces serialization. Using one handle from several
/// threads at once is the caller's responsibility.
pub struct CreationGateway {
    engine: Arc<dyn DocumentEngine>,
    config: GatewayConfig,
    documents: RwLock<HandleTable<OpenDocument>>,
    engine_lock: Mutex<()>,
}

impl CreationGateway {
    pub fn new(engine: impl DocumentEngine + 'static) -> Self {
        Self::with_config(Arc::new(engine), GatewayConfig::default())
    }

    pub fn with_config(engine: Arc<dyn DocumentEngine>, config: GatewayConfig) -> Self {
        Self {
            engine,
            config,
            documents: RwLock::new(HandleTable::new()),
            engine_lock: Mutex::new(()),
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Number of documents created and not yet released.
    pub fn open_documents(&self) -> usize {
        self.documents.read().len()
    }

    /// Create a document from `request`.
    ///
    /// Malformed requests fail with [`Error::InvalidArgument`] without
    /// reaching the engine.
    pub fn create(&self, request: CreationRequest) -> CreationResult {
        request.validate(self.config.max_buffer_size)?;

        let buffer = &request.properties_buffer[..];
        let decoded = if self.config.require_file_identifier {
            properties::decode_strict(request.kind, buffer)
        } else {
            properties::decode(request.kind, buffer)
        };
        let model = decoded.map_err(|e| {
            Error::InvalidArgument(format!("malformed properties buffer: {}", e))
        })?;

        debug!(
            engine = self.engine.name(),
            kind = %request.kind,
            file_name = %request.file_name,
            in_memory = model.is_in_memory,
            "creating document"
        );

        let spec = CreateSpec {
            kind: request.kind,
            file_name: &request.file_name,
            properties: &model,
            raw_properties: buffer,
        };
        let document = self.call_engine("create", || self.engine.create(&spec))?;
        let created = document.kind();
        if created != request.kind {
            warn!(
                engine = self.engine.name(),
                requested = %request.kind,
                %created,
                "engine created a document of the wrong kind"
            );
            let _ = self.call_engine("close", || document.close());
            return Err(Error::Engine(format!(
                "engine '{}' created a {} document for a {} request",
                self.engine.name(),
                created,
                request.kind
            )));
        }

        let inserted = self.documents.write().insert(OpenDocument {
            kind: request.kind,
            cell: Arc::new(Mutex::new(Some(document))),
        });
        match inserted {
            Some(raw) => {
                debug!(handle = raw, kind = %request.kind, "document created");
                Ok(DocumentHandle::from_raw(raw))
            },
            None => Err(Error::Transport("document handle space exhausted".to_string())),
        }
    }

    /// Persist the document behind `handle` to `destination`.
    ///
    /// The handle stays valid; no new handle is issued.
    pub fn save_as(&self, handle: &DocumentHandle, destination: impl AsRef<Path>) -> Result<()> {
        self.save_as_checked(handle.as_raw(), None, destination.as_ref())
    }

    /// Like [`save_as`](Self::save_as), but the handle must refer to a
    /// document of `kind`.
    pub fn save_as_kind(
        &self,
        handle: &DocumentHandle,
        kind: DocumentKind,
        destination: impl AsRef<Path>,
    ) -> Result<()> {
        self.save_as_checked(handle.as_raw(), Some(kind), destination.as_ref())
    }

    fn save_as_checked(
        &self,
        raw: u64,
        kind: Option<DocumentKind>,
        destination: &Path,
    ) -> Result<()> {
        if destination.as_os_str().is_empty() {
            return Err(Error::InvalidArgument("destination is empty".to_string()));
        }
        let cell = {
            let documents = self.documents.read();
            let open = documents.get(raw).ok_or(Error::InvalidHandle(raw))?;
            if kind.is_some_and(|expected| expected != open.kind) {
                return Err(Error::InvalidHandle(raw));
            }
            Arc::clone(&open.cell)
        };

        debug!(handle = raw, destination = %destination.display(), "saving document");
        let mut guard = cell.lock();
        // Released while we were waiting for the lock.
        let document = guard.as_mut().ok_or(Error::InvalidHandle(raw))?;
        self.call_engine("save_as", || document.save_as(destination))
    }

    /// The kind of document behind `handle`.
    pub fn kind_of(&self, handle: &DocumentHandle) -> Result<DocumentKind> {
        let raw = handle.as_raw();
        self.documents
            .read()
            .get(raw)
            .map(|open| open.kind)
            .ok_or(Error::InvalidHandle(raw))
    }

    /// Release the document behind `handle`, closing it in the engine.
    ///
    /// The handle is retired even when the engine reports a failure while
    /// closing.
    pub fn release(&self, handle: DocumentHandle) -> Result<()> {
        let raw = handle.into_raw();
        let open = self
            .documents
            .write()
            .remove(raw)
            .ok_or(Error::InvalidHandle(raw))?;
        debug!(handle = raw, kind = %open.kind, "releasing document");

        let document = open.cell.lock().take();
        match document {
            Some(document) => self.call_engine("close", || document.close()),
            None => Err(Error::InvalidHandle(raw)),
        }
    }

    fn call_engine<T>(
        &self,
        operation: &'static str,
        call: impl FnOnce() -> EngineResult<T>,
    ) -> Result<T> {
        let serialize = self.config.serialize_engine_calls
            || self.engine.thread_safety() == ThreadSafety::Serialized;
        let _serialized = serialize.then(|| self.engine_lock.lock());

        match catch_unwind(AssertUnwindSafe(call)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(EngineFailure::Rejected(message))) => {
                warn!(engine = self.engine.name(), operation, %message, "engine rejected request");
                Err(Error::Engine(message))
            },
            Ok(Err(EngineFailure::Unavailable(message))) => {
                warn!(engine = self.engine.name(), operation, %message, "engine unavailable");
                Err(Error::Transport(message))
            },
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(engine = self.engine.name(), operation, %message, "engine panicked");
                Err(Error::Transport(format!(
                    "engine '{}' panicked during {}: {}",
                    self.engine.name(),
                    operation,
                    message
                )))
            },
        }
    }
}

impl Drop for CreationGateway {
    fn drop(&mut self) {
        let leftovers = self.documents.get_mut().drain();
        if leftovers.is_empty() {
            return;
        }
        warn!(
            engine = self.engine.name(),
            count = leftovers.len(),
            "closing documents that were never released"
        );
        for open in leftovers {
            if let Some(document) = open.cell.lock().take() {
                let _ = catch_unwind(AssertUnwindSafe(|| document.close()));
            }
        }
    }
}

impl std::fmt::Debug for CreationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreationGateway")
            .field("engine", &self.engine.name())
            .field("config", &self.config)
            .field("open_documents", &self.open_documents())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::engine::UnavailableEngine;
    use crate::properties::DocumentPropertiesModel;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        created: AtomicUsize,
        saved: AtomicUsize,
        closed: AtomicUsize,
    }

    /// Engine that records calls and can be told to misbehave.
    struct ScriptedEngine {
        counters: Arc<Counters>,
        reject_with: Option<String>,
        panic_on_create: bool,
        create_as: Option<DocumentKind>,
    }

    impl ScriptedEngine {
        fn healthy() -> (Self, Arc<Counters>) {
            let counters = Arc::new(Counters::default());
            let engine = Self {
                counters: Arc::clone(&counters),
                reject_with: None,
                panic_on_create: false,
                create_as: None,
            };
            (engine, counters)
        }
    }

    struct ScriptedDocument {
        kind: DocumentKind,
        counters: Arc<Counters>,
        saved_to: Vec<PathBuf>,
    }

    impl EngineDocument for ScriptedDocument {
        fn kind(&self) -> DocumentKind {
            self.kind
        }

        fn save_as(&mut self, destination: &Path) -> EngineResult<()> {
            self.counters.saved.fetch_add(1, Ordering::SeqCst);
            self.saved_to.push(destination.to_path_buf());
            Ok(())
        }

        fn close(self: Box<Self>) -> EngineResult<()> {
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl DocumentEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        fn create(&self, spec: &CreateSpec<'_>) -> EngineResult<Box<dyn EngineDocument>> {
            self.counters.created.fetch_add(1, Ordering::SeqCst);
            if self.panic_on_create {
                panic!("engine exploded");
            }
            if let Some(message) = &self.reject_with {
                return Err(EngineFailure::Rejected(message.clone()));
            }
            Ok(Box::new(ScriptedDocument {
                kind: self.create_as.unwrap_or(spec.kind),
                counters: Arc::clone(&self.counters),
                saved_to: Vec::new(),
            }))
        }
    }

    fn book_request() -> CreationRequest {
        CreationRequest::from_properties(
            DocumentKind::Spreadsheet,
            "book1.xlsx",
            &DocumentPropertiesModel::in_memory(),
        )
        .unwrap()
    }

    #[test]
    fn test_create_save_release_scenario() {
        let (engine, counters) = ScriptedEngine::healthy();
        let gateway = CreationGateway::new(engine);

        let handle = gateway.create(book_request()).unwrap();
        assert_eq!(gateway.open_documents(), 1);
        assert_eq!(gateway.kind_of(&handle).unwrap(), DocumentKind::Spreadsheet);

        gateway.save_as(&handle, "book1.xlsx").unwrap();
        assert_eq!(counters.saved.load(Ordering::SeqCst), 1);

        let raw = handle.as_raw();
        gateway.release(handle).unwrap();
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.open_documents(), 0);

        let stale = DocumentHandle::from_raw(raw);
        assert!(matches!(gateway.save_as(&stale, "x"), Err(Error::InvalidHandle(r)) if r == raw));
        assert!(matches!(gateway.release(stale), Err(Error::InvalidHandle(_))));
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_document_of_wrong_kind_is_closed_and_rejected() {
        let (mut engine, counters) = ScriptedEngine::healthy();
        engine.create_as = Some(DocumentKind::Word);
        let gateway = CreationGateway::new(engine);

        match gateway.create(book_request()) {
            Err(Error::Engine(message)) => {
                assert!(message.contains("Word"));
                assert!(message.contains("Excel"));
            },
            other => panic!("expected engine error, got {:?}", other),
        }
        assert_eq!(counters.created.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.open_documents(), 0);
    }

    #[test]
    fn test_size_mismatch_never_reaches_engine() {
        let (engine, counters) = ScriptedEngine::healthy();
        let gateway = CreationGateway::new(engine);

        let request = book_request();
        let size = request.buffer_size;
        for wrong in [0, size - 1, size + 1, usize::MAX] {
            let result = gateway.create(request.clone().with_buffer_size(wrong));
            assert!(matches!(result, Err(Error::InvalidArgument(_))));
        }
        assert_eq!(counters.created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_malformed_or_mistagged_buffer_never_reaches_engine() {
        let (engine, counters) = ScriptedEngine::healthy();
        let gateway = CreationGateway::new(engine);

        let garbage = CreationRequest::new(DocumentKind::Word, "a.docx", vec![0xFFu8; 16]);
        assert!(matches!(gateway.create(garbage), Err(Error::InvalidArgument(_))));

        let wrong_kind = CreationRequest::from_properties(
            DocumentKind::Word,
            "a.xlsx",
            &DocumentPropertiesModel::default(),
        )
        .unwrap();
        let wrong_kind = CreationRequest {
            kind: DocumentKind::Spreadsheet,
            ..wrong_kind
        };
        assert!(matches!(gateway.create(wrong_kind), Err(Error::InvalidArgument(_))));
        assert_eq!(counters.created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_strict_identifier_config() {
        let (engine, _counters) = ScriptedEngine::healthy();
        let config = GatewayConfig {
            require_file_identifier: true,
            ..GatewayConfig::default()
        };
        let gateway = CreationGateway::with_config(Arc::new(engine), config);

        let mut bytes = properties::encode(
            DocumentKind::Presentation,
            &DocumentPropertiesModel::default(),
        )
        .unwrap();
        bytes[4..8].fill(0);
        let request = CreationRequest::new(DocumentKind::Presentation, "deck.pptx", bytes);
        assert!(matches!(gateway.create(request), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_engine_rejection_is_verbatim() {
        let (mut engine, _counters) = ScriptedEngine::healthy();
        engine.reject_with = Some("Workbook is locked -> retry later".to_string());
        let gateway = CreationGateway::new(engine);

        match gateway.create(book_request()) {
            Err(Error::Engine(message)) => assert_eq!(message, "Workbook is locked -> retry later"),
            other => panic!("expected engine error, got {:?}", other),
        }
        assert_eq!(gateway.open_documents(), 0);
    }

    #[test]
    fn test_engine_panic_becomes_transport_error() {
        let (mut engine, _counters) = ScriptedEngine::healthy();
        engine.panic_on_create = true;
        let gateway = CreationGateway::new(engine);

        match gateway.create(book_request()) {
            Err(Error::Transport(message)) => assert!(message.contains("engine exploded")),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_unavailable_engine_is_transport_error() {
        let gateway = CreationGateway::new(UnavailableEngine);
        assert!(matches!(gateway.create(book_request()), Err(Error::Transport(_))));
    }

    #[test]
    fn test_exactly_one_of_handle_or_error() {
        let (engine, _counters) = ScriptedEngine::healthy();
        let gateway = CreationGateway::new(engine);
        let requests = [
            book_request(),
            book_request().with_buffer_size(3),
            CreationRequest::new(DocumentKind::Word, "", vec![1u8, 2, 3]),
            CreationRequest::new(DocumentKind::Word, "x.docx", vec![0u8; 2]),
        ];
        for request in requests {
            match gateway.create(request) {
                Ok(handle) => gateway.release(handle).unwrap(),
                Err(err) => assert!(!err.to_string().is_empty()),
            }
        }
    }

    #[test]
    fn test_save_as_kind_checks_handle_kind() {
        let (engine, _counters) = ScriptedEngine::healthy();
        let gateway = CreationGateway::new(engine);
        let handle = gateway.create(book_request()).unwrap();

        assert!(matches!(
            gateway.save_as_kind(&handle, DocumentKind::Word, "out.docx"),
            Err(Error::InvalidHandle(_))
        ));
        gateway
            .save_as_kind(&handle, DocumentKind::Spreadsheet, "out.xlsx")
            .unwrap();
        assert!(matches!(gateway.save_as(&handle, ""), Err(Error::InvalidArgument(_))));
        gateway.release(handle).unwrap();
    }

    #[test]
    fn test_unreleased_documents_are_closed_on_drop() {
        let (engine, counters) = ScriptedEngine::healthy();
        let gateway = CreationGateway::new(engine);
        let a = gateway.create(book_request()).unwrap();
        let b = gateway.create(book_request()).unwrap();
        assert_ne!(a, b);
        drop(gateway);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_independent_handles() {
        let (engine, counters) = ScriptedEngine::healthy();
        let gateway = Arc::new(CreationGateway::new(engine));

        let workers: Vec<_> = (0..8)
            .map(|i| {
                let gateway = Arc::clone(&gateway);
                std::thread::spawn(move || {
                    let handle = gateway.create(book_request()).unwrap();
                    gateway.save_as(&handle, format!("book{}.xlsx", i)).unwrap();
                    gateway.release(handle).unwrap();
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(counters.created.load(Ordering::SeqCst), 8);
        assert_eq!(counters.saved.load(Ordering::SeqCst), 8);
        assert_eq!(counters.closed.load(Ordering::SeqCst), 8);
        assert_eq!(gateway.open_documents(), 0);
    }
}
