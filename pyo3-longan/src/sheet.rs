//! Excel workbook bindings

use longan::DocumentKind;
use pyo3::prelude::*;
use pyo3::types::PyModule;

use crate::common::document_class;

/// Registers sheet types with the Python module
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Excel>()?;
    Ok(())
}

document_class!(
    /// Excel workbook (.xlsx)
    ///
    /// Examples:
    ///     >>> book = Excel("book1.xlsx", is_in_memory=True)
    ///     >>> book.save_as("book1.xlsx")
    ///     >>> book.close()
    Excel,
    DocumentKind::Spreadsheet
);
