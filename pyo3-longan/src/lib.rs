//! Python bindings for Longan - document creation gateway
//!
//! This module provides Python bindings for the Longan Rust library using PyO3.

use pyo3::prelude::*;
use pyo3::types::PyModule;

mod common;
mod document;
mod presentation;
mod sheet;

/// Longan - document creation gateway
///
/// Python classes for creating Office documents through the installed
/// document engine:
/// - Word documents (.docx)
/// - PowerPoint presentations (.pptx)
/// - Excel workbooks (.xlsx)
///
/// # Examples
///
/// ```python
/// from longan_py import Excel, use_loopback_engine
///
/// use_loopback_engine()
///
/// with Excel("book1.xlsx", is_in_memory=True, title="Budget") as book:
///     book.save_as("book1.xlsx")
/// ```
///
/// ## Working with properties buffers directly
///
/// ```python
/// from longan_py import encode_properties, decode_properties
///
/// data = encode_properties("excel", is_in_memory=True)
/// assert decode_properties("excel", data)["is_in_memory"]
/// ```
#[pymodule]
fn longan_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Register exceptions and free functions
    common::register(m)?;

    // Register document types
    document::register(m)?;

    // Register presentation types
    presentation::register(m)?;

    // Register sheet types
    sheet::register(m)?;

    Ok(())
}
