//! Process-wide gateway shared by the C ABI and the Python binding.
//!
//! Foreign callers cannot hold a Rust `CreationGateway`, so one is kept
//! here. Until an engine is installed it is backed by
//! [`UnavailableEngine`] and every `create` fails with a transport error.
//!
//! Calls made through [`with_current`] hold the registry's read lock until
//! they return, so an engine is never replaced underneath a running call.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use super::config::GatewayConfig;
use super::creation::CreationGateway;
use super::engine::{DocumentEngine, UnavailableEngine};
use super::loopback::LoopbackEngine;
use crate::common::{Error, Result};

/// A replaceable gateway.
pub struct GatewaySlot {
    gateway: RwLock<Arc<CreationGateway>>,
}

impl GatewaySlot {
    pub fn new(gateway: CreationGateway) -> Self {
        Self {
            gateway: RwLock::new(Arc::new(gateway)),
        }
    }

    /// The installed gateway. Holding the `Arc` does not block replacement.
    pub fn current(&self) -> Arc<CreationGateway> {
        Arc::clone(&self.gateway.read())
    }

    /// Run `call` against the installed gateway, blocking replacement until
    /// it returns.
    pub fn with_current<R>(&self, call: impl FnOnce(&CreationGateway) -> R) -> R {
        let gateway = self.gateway.read();
        call(&gateway)
    }

    /// Replace the gateway.
    ///
    /// Waits for calls running through [`with_current`](Self::with_current),
    /// then refuses if documents created through the current gateway are
    /// still open, since their handles would stop resolving.
    pub fn install(&self, engine: Arc<dyn DocumentEngine>, config: GatewayConfig) -> Result<()> {
        replace(&mut self.gateway.write(), engine, config)
    }

    /// Install [`LoopbackEngine`] unless it is already installed.
    pub fn install_loopback(&self) -> Result<()> {
        let mut slot = self.gateway.write();
        if slot.engine_name() == LoopbackEngine.name() {
            return Ok(());
        }
        replace(&mut slot, Arc::new(LoopbackEngine), GatewayConfig::default())
    }
}

impl Default for GatewaySlot {
    fn default() -> Self {
        Self::new(CreationGateway::new(UnavailableEngine))
    }
}

fn replace(
    slot: &mut Arc<CreationGateway>,
    engine: Arc<dyn DocumentEngine>,
    config: GatewayConfig,
) -> Result<()> {
    let open = slot.open_documents();
    if open > 0 {
        return Err(Error::InvalidArgument(format!(
            "cannot replace engine '{}' while {} document(s) are open",
            slot.engine_name(),
            open
        )));
    }
    info!(engine = engine.name(), previous = slot.engine_name(), "installing document engine");
    *slot = Arc::new(CreationGateway::with_config(engine, config));
    Ok(())
}

static GLOBAL: Lazy<GatewaySlot> = Lazy::new(GatewaySlot::default);

/// The process-wide gateway.
pub fn current() -> Arc<CreationGateway> {
    GLOBAL.current()
}

/// See [`GatewaySlot::with_current`].
pub fn with_current<R>(call: impl FnOnce(&CreationGateway) -> R) -> R {
    GLOBAL.with_current(call)
}

/// Replace the process-wide engine. See [`GatewaySlot::install`].
pub fn install(engine: Arc<dyn DocumentEngine>, config: GatewayConfig) -> Result<()> {
    GLOBAL.install(engine, config)
}

/// Install [`LoopbackEngine`] process-wide unless it is already installed.
pub fn install_loopback() -> Result<()> {
    GLOBAL.install_loopback()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DocumentKind;
    use crate::gateway::engine::{CreateSpec, EngineDocument, EngineResult, ThreadSafety};
    use crate::gateway::{CreationRequest, DocumentHandle};
    use crate::properties::DocumentPropertiesModel;
    use std::path::Path;
    use std::sync::mpsc;
    use std::sync::Mutex as StdMutex;
    use std::thread;
    use std::time::Duration;

    fn request(dir: &Path, name: &str) -> CreationRequest {
        CreationRequest::from_properties(
            DocumentKind::Spreadsheet,
            dir.join(name).to_string_lossy(),
            &DocumentPropertiesModel::in_memory(),
        )
        .unwrap()
    }

    #[test]
    fn test_loopback_install_is_idempotent_and_guarded() {
        install_loopback().unwrap();
        install_loopback().unwrap();
        let gateway = current();
        assert_eq!(gateway.engine_name(), "loopback");

        let dir = tempfile::tempdir().unwrap();
        let handle = gateway.create(request(dir.path(), "held.xlsx")).unwrap();

        let replaced = install(Arc::new(UnavailableEngine), GatewayConfig::default());
        assert!(matches!(replaced, Err(Error::InvalidArgument(_))));
        assert_eq!(current().engine_name(), "loopback");

        gateway.release(handle).unwrap();
    }

    #[test]
    fn test_released_handle_stays_dead_after_reinstall() {
        let slot = GatewaySlot::default();
        let dir = tempfile::tempdir().unwrap();

        slot.install_loopback().unwrap();
        let first = slot.current().create(request(dir.path(), "a.xlsx")).unwrap();
        let stale = first.as_raw();
        slot.current().release(first).unwrap();

        slot.install(Arc::new(UnavailableEngine), GatewayConfig::default())
            .unwrap();
        slot.install_loopback().unwrap();
        let gateway = slot.current();
        let second = gateway.create(request(dir.path(), "b.xlsx")).unwrap();
        assert_ne!(second.as_raw(), stale);

        assert!(matches!(
            gateway.save_as(&DocumentHandle::from_raw(stale), dir.path().join("x.xlsx")),
            Err(Error::InvalidHandle(_))
        ));
        assert!(matches!(
            gateway.release(DocumentHandle::from_raw(stale)),
            Err(Error::InvalidHandle(_))
        ));
        assert_eq!(gateway.open_documents(), 1);
        gateway.release(second).unwrap();
    }

    /// Engine whose `create` waits until the test lets it finish.
    struct GatedEngine {
        entered: StdMutex<mpsc::Sender<()>>,
        proceed: StdMutex<mpsc::Receiver<()>>,
    }

    struct GatedDocument;

    impl EngineDocument for GatedDocument {
        fn kind(&self) -> DocumentKind {
            DocumentKind::Spreadsheet
        }

        fn save_as(&mut self, _destination: &Path) -> EngineResult<()> {
            Ok(())
        }
    }

    impl DocumentEngine for GatedEngine {
        fn name(&self) -> &str {
            "gated"
        }

        fn thread_safety(&self) -> ThreadSafety {
            ThreadSafety::IndependentHandles
        }

        fn create(&self, _spec: &CreateSpec<'_>) -> EngineResult<Box<dyn EngineDocument>> {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.proceed.lock().unwrap().recv();
            Ok(Box::new(GatedDocument))
        }
    }

    #[test]
    fn test_install_waits_for_running_create() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (proceed_tx, proceed_rx) = mpsc::channel();
        let slot = Arc::new(GatewaySlot::new(CreationGateway::new(GatedEngine {
            entered: StdMutex::new(entered_tx),
            proceed: StdMutex::new(proceed_rx),
        })));
        let dir = tempfile::tempdir().unwrap();

        let creator = {
            let slot = Arc::clone(&slot);
            let request = request(dir.path(), "gated.xlsx");
            thread::spawn(move || slot.with_current(|gateway| gateway.create(request)))
        };
        entered_rx.recv().unwrap();

        let installer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || slot.install(Arc::new(LoopbackEngine), GatewayConfig::default()))
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!installer.is_finished(), "install must wait for the running create");

        proceed_tx.send(()).unwrap();
        let handle = creator.join().unwrap().unwrap();
        let installed = installer.join().unwrap();
        assert!(matches!(installed, Err(Error::InvalidArgument(_))));

        let gateway = slot.current();
        assert_eq!(gateway.engine_name(), "gated");
        gateway.save_as(&handle, dir.path().join("out.xlsx")).unwrap();
        gateway.release(handle).unwrap();
    }
}
