//! PowerPoint presentation bindings

use longan::DocumentKind;
use pyo3::prelude::*;
use pyo3::types::PyModule;

use crate::common::document_class;

/// Registers presentation types with the Python module
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PowerPoint>()?;
    Ok(())
}

document_class!(
    /// PowerPoint presentation (.pptx)
    PowerPoint,
    DocumentKind::Presentation
);
