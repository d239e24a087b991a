//! `extern "C"` entry points.
//!
//! # Safety contract
//!
//! * Pointers are checked for null before use; a null required pointer is
//!   `InvalidArgument`.
//! * Panics are caught and reported as `UnknownError`; they never unwind
//!   into the caller.
//! * `*out_error` is set to null on success and to a message on failure.
//!   Messages are owned by the caller and must be freed with
//!   [`longan_string_free`].

use bytes::Bytes;
use std::ffi::{CStr, CString, c_char};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;
use std::slice;

use super::status::StatusCode;
use crate::common::{DocumentKind, Error, Result};
use crate::gateway::{CreationRequest, DocumentHandle, global};
use crate::properties::{self, CoreProperties, DocumentPropertiesModel};

/// Turn `message` into a caller-owned C string, replacing interior NULs.
fn into_c_string(message: String) -> *mut c_char {
    let sanitized = message.replace('\0', "\u{FFFD}");
    CString::new(sanitized)
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

/// Store an error in `out_error` if the caller gave us somewhere to put it.
unsafe fn set_error(out_error: *mut *mut c_char, message: String) {
    if !out_error.is_null() {
        unsafe { *out_error = into_c_string(message) };
    }
}

/// Run `body`, translating its outcome into a status code and `out_error`.
unsafe fn run(out_error: *mut *mut c_char, body: impl FnOnce() -> Result<()>) -> i8 {
    if !out_error.is_null() {
        unsafe { *out_error = ptr::null_mut() };
    }
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => StatusCode::Success as i8,
        Ok(Err(err)) => {
            let status = StatusCode::from(&err);
            unsafe { set_error(out_error, err.to_string()) };
            status as i8
        },
        Err(_) => {
            tracing::warn!("panic caught at the C boundary");
            unsafe { set_error(out_error, "internal panic in longan".to_string()) };
            StatusCode::UnknownError as i8
        },
    }
}

unsafe fn read_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(Error::InvalidArgument(format!("{} is null", what)));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| Error::InvalidArgument(format!("{} is not valid UTF-8", what)))
}

/// Read an optional string; null is `None`.
unsafe fn read_optional_str(ptr: *const c_char, what: &str) -> Result<Option<String>> {
    if ptr.is_null() {
        return Ok(None);
    }
    unsafe { read_str(ptr, what) }.map(|text| Some(text.to_owned()))
}

unsafe fn create(
    kind: DocumentKind,
    file_name: *const c_char,
    buffer: *const u8,
    buffer_size: usize,
    out_handle: *mut u64,
    out_error: *mut *mut c_char,
) -> i8 {
    unsafe {
        run(out_error, || {
            if out_handle.is_null() {
                return Err(Error::InvalidArgument("out_handle is null".to_string()));
            }
            *out_handle = 0;
            let file_name = read_str(file_name, "file_name")?;
            if buffer.is_null() {
                return Err(Error::InvalidArgument("buffer is null".to_string()));
            }
            let handle = global::with_current(|gateway| {
                // Checked before the slice is formed, so a bogus size is never
                // used to read memory.
                let limit = gateway.config().max_buffer_size;
                if buffer_size == 0 || buffer_size > limit {
                    return Err(Error::InvalidArgument(format!(
                        "buffer_size {} is outside 1..={}",
                        buffer_size, limit
                    )));
                }
                let bytes = Bytes::copy_from_slice(slice::from_raw_parts(buffer, buffer_size));
                gateway.create(CreationRequest::new(kind, file_name, bytes))
            })?;
            *out_handle = handle.into_raw();
            Ok(())
        })
    }
}

unsafe fn save_as(
    kind: Option<DocumentKind>,
    handle: u64,
    destination: *const c_char,
    out_error: *mut *mut c_char,
) -> i8 {
    unsafe {
        run(out_error, || {
            let destination = read_str(destination, "destination")?;
            let handle = DocumentHandle::from_raw(handle);
            global::with_current(|gateway| match kind {
                Some(kind) => gateway.save_as_kind(&handle, kind, destination),
                None => gateway.save_as(&handle, destination),
            })
        })
    }
}

macro_rules! document_kind_exports {
    ($kind:expr, $label:literal, $create:ident, $save_as:ident) => {
        #[doc = concat!("Create a new ", $label, " document.")]
        ///
        /// On success `*out_handle` is non-zero and `*out_error` is null. On
        /// failure `*out_handle` is zero and `*out_error` holds a message
        /// (when `out_error` is non-null).
        ///
        /// # Safety
        ///
        /// `file_name` must be a NUL-terminated string, `buffer` must be
        /// readable for `buffer_size` bytes, and `out_handle`/`out_error`
        /// must be null or writable.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $create(
            file_name: *const c_char,
            buffer: *const u8,
            buffer_size: usize,
            out_handle: *mut u64,
            out_error: *mut *mut c_char,
        ) -> i8 {
            unsafe { create($kind, file_name, buffer, buffer_size, out_handle, out_error) }
        }

        #[doc = concat!("Save a ", $label, " document to `destination`.")]
        ///
        /// A handle of another document kind is `InvalidHandle`.
        ///
        /// # Safety
        ///
        /// `destination` must be a NUL-terminated string and `out_error`
        /// must be null or writable.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $save_as(
            handle: u64,
            destination: *const c_char,
            out_error: *mut *mut c_char,
        ) -> i8 {
            unsafe { save_as(Some($kind), handle, destination, out_error) }
        }
    };
}

document_kind_exports!(DocumentKind::Word, "Word", longan_word_create, longan_word_save_as);
document_kind_exports!(
    DocumentKind::Presentation,
    "PowerPoint",
    longan_power_point_create,
    longan_power_point_save_as
);
document_kind_exports!(
    DocumentKind::Spreadsheet,
    "Excel",
    longan_excel_create,
    longan_excel_save_as
);

/// Save any document to `destination`.
///
/// # Safety
///
/// `destination` must be a NUL-terminated string and `out_error` must be
/// null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn longan_document_save_as(
    handle: u64,
    destination: *const c_char,
    out_error: *mut *mut c_char,
) -> i8 {
    unsafe { save_as(None, handle, destination, out_error) }
}

/// Release a document. A second release returns `InvalidHandle`.
///
/// # Safety
///
/// `out_error` must be null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn longan_document_release(handle: u64, out_error: *mut *mut c_char) -> i8 {
    unsafe {
        run(out_error, || {
            global::with_current(|gateway| gateway.release(DocumentHandle::from_raw(handle)))
        })
    }
}

/// Encode a properties buffer for document kind `kind` (0 Word,
/// 1 PowerPoint, 2 Excel).
///
/// Each core property may be null, in which case it is left unset.
///
/// The buffer is owned by the caller and must be freed with
/// [`longan_buffer_free`] using the returned length.
///
/// # Safety
///
/// Non-null core properties must be NUL-terminated strings. `out_buffer`
/// and `out_len` must be writable; `out_error` must be null or writable.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn longan_properties_encode(
    kind: u8,
    is_in_memory: bool,
    is_editable: bool,
    title: *const c_char,
    subject: *const c_char,
    description: *const c_char,
    tags: *const c_char,
    category: *const c_char,
    creator: *const c_char,
    out_buffer: *mut *mut u8,
    out_len: *mut usize,
    out_error: *mut *mut c_char,
) -> i8 {
    unsafe {
        run(out_error, || {
            if out_buffer.is_null() || out_len.is_null() {
                return Err(Error::InvalidArgument(
                    "out_buffer and out_len must not be null".to_string(),
                ));
            }
            *out_buffer = ptr::null_mut();
            *out_len = 0;
            let kind = DocumentKind::from_tag(kind)
                .ok_or_else(|| Error::InvalidArgument(format!("unknown document kind {}", kind)))?;
            let core = CoreProperties {
                title: read_optional_str(title, "title")?,
                subject: read_optional_str(subject, "subject")?,
                description: read_optional_str(description, "description")?,
                tags: read_optional_str(tags, "tags")?,
                category: read_optional_str(category, "category")?,
                creator: read_optional_str(creator, "creator")?,
            };
            let model = DocumentPropertiesModel {
                is_in_memory,
                is_editable,
                core,
            };
            let bytes = properties::encode(kind, &model)?.into_boxed_slice();
            *out_len = bytes.len();
            *out_buffer = Box::into_raw(bytes).cast::<u8>();
            Ok(())
        })
    }
}

/// Free a buffer returned by [`longan_properties_encode`].
///
/// # Safety
///
/// `buffer` and `len` must come from one successful encode call, and the
/// buffer must not be freed twice. Null is ignored.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn longan_buffer_free(buffer: *mut u8, len: usize) {
    if buffer.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(buffer, len)) });
}

/// Free an error message handed out through `out_error`.
///
/// # Safety
///
/// `message` must come from this library and must not be freed twice.
/// Null is ignored.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn longan_string_free(message: *mut c_char) {
    if message.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(message) });
}

/// Install the in-process loopback engine as the process-wide engine.
///
/// # Safety
///
/// `out_error` must be null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn longan_use_loopback_engine(out_error: *mut *mut c_char) -> i8 {
    unsafe { run(out_error, global::install_loopback) }
}
