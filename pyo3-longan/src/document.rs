//! Word document bindings

use longan::DocumentKind;
use pyo3::prelude::*;
use pyo3::types::PyModule;

use crate::common::document_class;

/// Registers document types with the Python module
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Word>()?;
    Ok(())
}

document_class!(
    /// Word document (.docx)
    ///
    /// Examples:
    ///     >>> with Word("report.docx", title="Quarterly report") as doc:
    ///     ...     doc.save_as("report-final.docx")
    Word,
    DocumentKind::Word
);
