//! Common types and utilities

use longan::gateway::{CreationGateway, CreationRequest, DocumentHandle, global};
use longan::properties::{self, CoreProperties, DocumentPropertiesModel};
use longan::{DocumentKind, Error};
use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict, PyModule};
use std::path::Path;
use std::sync::Arc;

create_exception!(longan_py, LonganError, PyException, "Base class for gateway failures.");
create_exception!(longan_py, InvalidHandleError, LonganError, "The document handle is closed or unknown.");
create_exception!(longan_py, EngineError, LonganError, "The document engine rejected the request.");
create_exception!(longan_py, TransportError, LonganError, "The document engine could not be reached.");

/// Registers exceptions and free functions with the Python module
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();
    m.add("LonganError", py.get_type::<LonganError>())?;
    m.add("InvalidHandleError", py.get_type::<InvalidHandleError>())?;
    m.add("EngineError", py.get_type::<EngineError>())?;
    m.add("TransportError", py.get_type::<TransportError>())?;
    m.add_function(wrap_pyfunction!(encode_properties, m)?)?;
    m.add_function(wrap_pyfunction!(decode_properties, m)?)?;
    m.add_function(wrap_pyfunction!(detect_kind, m)?)?;
    m.add_function(wrap_pyfunction!(use_loopback_engine, m)?)?;
    m.add_function(wrap_pyfunction!(engine_name, m)?)?;
    Ok(())
}

/// Converts a Rust longan::Error to a Python exception
pub fn to_py_err(err: Error) -> PyErr {
    match err {
        Error::Io(e) => PyIOError::new_err(e.to_string()),
        Error::InvalidHandle(_) => InvalidHandleError::new_err(err.to_string()),
        Error::Engine(msg) => EngineError::new_err(msg),
        Error::Transport(_) => TransportError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// Parse a kind name ("word", "powerpoint", "excel") or a file name.
pub fn parse_kind(kind: &str) -> PyResult<DocumentKind> {
    match kind.to_ascii_lowercase().as_str() {
        "word" | "document" => Ok(DocumentKind::Word),
        "powerpoint" | "presentation" => Ok(DocumentKind::Presentation),
        "excel" | "spreadsheet" | "workbook" => Ok(DocumentKind::Spreadsheet),
        _ => DocumentKind::from_path(kind)
            .or_else(|| DocumentKind::from_path(format!("x.{}", kind.trim_start_matches('.'))))
            .ok_or_else(|| PyValueError::new_err(format!("Unknown document kind: {}", kind))),
    }
}

fn kind_name(kind: DocumentKind) -> String {
    kind.to_string().to_ascii_lowercase()
}

/// Builds the properties model from Python keyword arguments.
#[allow(clippy::too_many_arguments)]
pub fn build_properties(
    is_in_memory: bool,
    is_editable: bool,
    title: Option<String>,
    subject: Option<String>,
    description: Option<String>,
    tags: Option<String>,
    category: Option<String>,
    creator: Option<String>,
) -> DocumentPropertiesModel {
    DocumentPropertiesModel {
        is_in_memory,
        is_editable,
        core: CoreProperties {
            title,
            subject,
            description,
            tags,
            category,
            creator,
        },
    }
}

/// Converts a properties model to a Python dict
pub fn properties_to_dict<'py>(
    py: Python<'py>,
    model: &DocumentPropertiesModel,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("is_in_memory", model.is_in_memory)?;
    dict.set_item("is_editable", model.is_editable)?;
    let core = &model.core;
    dict.set_item("title", core.title.as_deref())?;
    dict.set_item("subject", core.subject.as_deref())?;
    dict.set_item("description", core.description.as_deref())?;
    dict.set_item("tags", core.tags.as_deref())?;
    dict.set_item("category", core.category.as_deref())?;
    dict.set_item("creator", core.creator.as_deref())?;
    Ok(dict)
}

/// Encode creation properties into a tagged buffer.
///
/// Args:
///     kind: "word", "powerpoint", "excel" or a file name with one of
///         their extensions
///
/// Returns:
///     bytes: The encoded buffer
#[pyfunction]
#[pyo3(signature = (kind, is_in_memory = false, is_editable = true, title = None, subject = None, description = None, tags = None, category = None, creator = None))]
#[allow(clippy::too_many_arguments)]
fn encode_properties<'py>(
    py: Python<'py>,
    kind: &str,
    is_in_memory: bool,
    is_editable: bool,
    title: Option<String>,
    subject: Option<String>,
    description: Option<String>,
    tags: Option<String>,
    category: Option<String>,
    creator: Option<String>,
) -> PyResult<Bound<'py, PyBytes>> {
    let kind = parse_kind(kind)?;
    let model = build_properties(
        is_in_memory,
        is_editable,
        title,
        subject,
        description,
        tags,
        category,
        creator,
    );
    let buffer = properties::encode(kind, &model).map_err(to_py_err)?;
    Ok(PyBytes::new(py, &buffer))
}

/// Decode a properties buffer into a dict.
///
/// Fields missing from the buffer come back as their defaults.
#[pyfunction]
fn decode_properties<'py>(
    py: Python<'py>,
    kind: &str,
    data: &[u8],
) -> PyResult<Bound<'py, PyDict>> {
    let kind = parse_kind(kind)?;
    let model = properties::decode(kind, data).map_err(to_py_err)?;
    properties_to_dict(py, &model)
}

/// Kind named by a buffer's file identifier, or None for untagged data.
#[pyfunction]
fn detect_kind(data: &[u8]) -> Option<String> {
    properties::peek_kind(data).map(kind_name)
}

/// Install the built-in loopback engine as the process-wide engine.
#[pyfunction]
fn use_loopback_engine() -> PyResult<()> {
    global::install_loopback().map_err(to_py_err)
}

/// Name of the installed document engine.
#[pyfunction]
fn engine_name() -> String {
    global::current().engine_name().to_string()
}

/// One document created through the process-wide gateway.
///
/// Shared by the Word, PowerPoint and Excel classes. The handle is
/// released on `close()` or, failing that, when the session is dropped.
pub struct DocumentSession {
    gateway: Arc<CreationGateway>,
    kind: DocumentKind,
    file_name: String,
    properties: DocumentPropertiesModel,
    buffer: Vec<u8>,
    handle: Option<DocumentHandle>,
}

impl DocumentSession {
    pub fn create(
        py: Python<'_>,
        kind: DocumentKind,
        file_name: String,
        properties: DocumentPropertiesModel,
    ) -> PyResult<Self> {
        let buffer = properties::encode(kind, &properties).map_err(to_py_err)?;
        let request = CreationRequest::new(kind, file_name.clone(), buffer.clone());
        let handle = py
            .detach(|| global::with_current(|gateway| gateway.create(request)))
            .map_err(to_py_err)?;
        // The open document keeps the engine from being replaced, so this is
        // the gateway that issued the handle.
        let gateway = global::current();
        Ok(Self {
            gateway,
            kind,
            file_name,
            properties,
            buffer,
            handle: Some(handle),
        })
    }

    fn open_handle(&self) -> PyResult<&DocumentHandle> {
        self.handle
            .as_ref()
            .ok_or_else(|| InvalidHandleError::new_err(format!("{} document is closed", self.kind)))
    }

    pub fn save_as(&self, py: Python<'_>, path: &Path) -> PyResult<()> {
        let handle = self.open_handle()?;
        let gateway = &self.gateway;
        let kind = self.kind;
        py.detach(|| gateway.save_as_kind(handle, kind, path))
            .map_err(to_py_err)
    }

    /// Release the document. Closing twice is a no-op.
    pub fn close(&mut self, py: Python<'_>) -> PyResult<()> {
        match self.handle.take() {
            Some(handle) => {
                let gateway = &self.gateway;
                py.detach(|| gateway.release(handle)).map_err(to_py_err)
            },
            None => Ok(()),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn properties(&self) -> &DocumentPropertiesModel {
        &self.properties
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn raw_handle(&self) -> Option<u64> {
        self.handle.as_ref().map(DocumentHandle::as_raw)
    }

    pub fn repr(&self, class: &str) -> String {
        let state = if self.handle.is_some() { "open" } else { "closed" };
        format!(
            "{}(file_name={:?}, is_in_memory={}, {})",
            class,
            self.file_name,
            if self.properties.is_in_memory { "True" } else { "False" },
            state
        )
    }
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.gateway.release(handle);
        }
    }
}

/// Defines a Python document class backed by a [`DocumentSession`].
macro_rules! document_class {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[::pyo3::pyclass(module = "longan_py")]
        pub struct $name {
            session: $crate::common::DocumentSession,
        }

        #[::pyo3::pymethods]
        impl $name {
            /// Create a document through the installed engine.
            ///
            /// Args:
            ///     file_name: Source file of the document
            ///     is_in_memory: Keep the document in memory instead of on disk
            ///     is_editable: Open the source for editing
            ///     title, subject, description, tags, category, creator:
            ///         Optional core properties
            #[new]
            #[pyo3(signature = (file_name, is_in_memory = true, is_editable = true, title = None, subject = None, description = None, tags = None, category = None, creator = None))]
            #[allow(clippy::too_many_arguments)]
            fn new(
                py: ::pyo3::Python<'_>,
                file_name: String,
                is_in_memory: bool,
                is_editable: bool,
                title: Option<String>,
                subject: Option<String>,
                description: Option<String>,
                tags: Option<String>,
                category: Option<String>,
                creator: Option<String>,
            ) -> ::pyo3::PyResult<Self> {
                let properties = $crate::common::build_properties(
                    is_in_memory,
                    is_editable,
                    title,
                    subject,
                    description,
                    tags,
                    category,
                    creator,
                );
                let session =
                    $crate::common::DocumentSession::create(py, $kind, file_name, properties)?;
                Ok(Self { session })
            }

            /// Save the document to a new path.
            fn save_as(&self, py: ::pyo3::Python<'_>, path: ::std::path::PathBuf) -> ::pyo3::PyResult<()> {
                self.session.save_as(py, &path)
            }

            /// Release the document. Safe to call more than once.
            fn close(&mut self, py: ::pyo3::Python<'_>) -> ::pyo3::PyResult<()> {
                self.session.close(py)
            }

            /// The creation properties as a dict.
            fn properties<'py>(
                &self,
                py: ::pyo3::Python<'py>,
            ) -> ::pyo3::PyResult<::pyo3::Bound<'py, ::pyo3::types::PyDict>> {
                $crate::common::properties_to_dict(py, self.session.properties())
            }

            /// The encoded properties buffer sent to the engine.
            fn properties_buffer<'py>(
                &self,
                py: ::pyo3::Python<'py>,
            ) -> ::pyo3::Bound<'py, ::pyo3::types::PyBytes> {
                ::pyo3::types::PyBytes::new(py, self.session.buffer())
            }

            #[getter]
            fn file_name(&self) -> &str {
                self.session.file_name()
            }

            #[getter]
            fn is_in_memory(&self) -> bool {
                self.session.properties().is_in_memory
            }

            #[getter]
            fn is_editable(&self) -> bool {
                self.session.properties().is_editable
            }

            /// Raw gateway handle, or None once closed.
            #[getter]
            fn handle(&self) -> Option<u64> {
                self.session.raw_handle()
            }

            #[getter]
            fn closed(&self) -> bool {
                self.session.raw_handle().is_none()
            }

            fn __enter__(slf: ::pyo3::PyRef<'_, Self>) -> ::pyo3::PyRef<'_, Self> {
                slf
            }

            #[pyo3(signature = (_exc_type = None, _exc_value = None, _traceback = None))]
            fn __exit__(
                &mut self,
                py: ::pyo3::Python<'_>,
                _exc_type: Option<::pyo3::Bound<'_, ::pyo3::PyAny>>,
                _exc_value: Option<::pyo3::Bound<'_, ::pyo3::PyAny>>,
                _traceback: Option<::pyo3::Bound<'_, ::pyo3::PyAny>>,
            ) -> ::pyo3::PyResult<bool> {
                self.session.close(py)?;
                Ok(false)
            }

            fn __repr__(&self) -> String {
                self.session.repr(stringify!($name))
            }
        }
    };
}

pub(crate) use document_class;
