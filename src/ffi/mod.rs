//! C foreign function interface.
//!
//! This module exposes a stable C ABI over the process-wide gateway (see
//! [`crate::gateway::global`]), so the engine can be driven from C, Python
//! (ctypes/cffi), C#, Go or Java.
//!
//! # Quick start (C)
//!
//! ```c
//! uint8_t *props; size_t props_len; char *err = NULL;
//! /* title .. creator; NULL leaves a property unset */
//! longan_properties_encode(2 /* Excel */, true, true, "Book 1", NULL, NULL, NULL, NULL,
//!                          "finance", &props, &props_len, &err);
//!
//! uint64_t book = 0;
//! if (longan_excel_create("book1.xlsx", props, props_len, &book, &err) != 0) {
//!     fprintf(stderr, "%s\n", err);
//!     longan_string_free(err);
//! }
//! longan_buffer_free(props, props_len);
//!
//! longan_excel_save_as(book, "book1.xlsx", &err);
//! longan_document_release(book, &err);
//! ```
//!
//! # Ownership
//!
//! * Handles are plain `uint64_t` values; `0` is never a valid handle.
//!   Each handle must be released exactly once with
//!   [`longan_document_release`]. Using it afterwards reports
//!   `InvalidHandle`.
//! * Error messages written to `out_error` belong to the caller and are
//!   freed with [`longan_string_free`].
//! * Buffers from [`longan_properties_encode`] are freed with
//!   [`longan_buffer_free`].
//!
//! # Thread safety
//!
//! Every function may be called from any thread. Calls on one handle from
//! several threads at once must be synchronized by the caller.

pub mod exports;
pub mod status;

pub use exports::*;
pub use status::{StatusCode, longan_status_name};
