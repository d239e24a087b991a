//! Properties Encoder.
//!
//! Document creation options travel to the engine as a flatbuffers table.
//! Fields are located through a vtable, so the schema can grow by appending
//! fields:
//!
//! - a newer reader decodes an older buffer and gets each missing field's
//!   default;
//! - an older reader decodes a newer buffer and skips fields it does not know.
//!
//! The buffer is tagged with the document kind through its 4-byte file
//! identifier. Buffers written without one are still accepted by [`decode`].
//!
//! # Example
//!
//! ```
//! use longan::DocumentKind;
//! use longan::properties::{DocumentPropertiesModel, decode, encode, peek_kind};
//!
//! # fn main() -> longan::Result<()> {
//! let bytes = encode(DocumentKind::Spreadsheet, &DocumentPropertiesModel::in_memory())?;
//! assert_eq!(peek_kind(&bytes), Some(DocumentKind::Spreadsheet));
//! assert!(decode(DocumentKind::Spreadsheet, &bytes)?.is_in_memory);
//! # Ok(())
//! # }
//! ```

// Submodule declarations
pub mod model;
pub mod schema;

// Re-exports
pub use model::{CoreProperties, DocumentPropertiesModel};
pub use schema::{PropertiesModel, SettingsModel};

use flatbuffers::FlatBufferBuilder;

use crate::common::binary::{read_u32_le, slice_at};
use crate::common::{DocumentKind, Error, Result};

/// Largest buffer a flatbuffers builder can produce.
const MAX_BUFFER_SIZE: usize = (1 << 31) - 1;

/// Encode `properties` as a buffer tagged for `kind`.
///
/// The output is canonical: fields equal to their defaults are omitted and
/// the `settings` table is only written when a core property is set.
pub fn encode(kind: DocumentKind, properties: &DocumentPropertiesModel) -> Result<Vec<u8>> {
    let core = &properties.core;
    let text_len: usize = [
        &core.title,
        &core.subject,
        &core.description,
        &core.tags,
        &core.category,
        &core.creator,
    ]
    .iter()
    .filter_map(|text| text.as_deref())
    .map(|text| text.len() + 8)
    .sum();
    if text_len > MAX_BUFFER_SIZE / 2 {
        return Err(Error::Encoding(format!(
            "core properties total {} bytes, above the {}-byte buffer limit",
            text_len, MAX_BUFFER_SIZE
        )));
    }

    let mut fbb = FlatBufferBuilder::with_capacity(64 + text_len);
    let settings = core
        .has_data()
        .then(|| schema::create_settings(&mut fbb, core));
    let root = schema::create_properties(
        &mut fbb,
        properties.is_in_memory,
        properties.is_editable,
        settings,
    );
    fbb.finish(root, Some(kind.file_identifier()));
    Ok(fbb.finished_data().to_vec())
}

/// Read the kind a buffer is tagged with, if it carries a known identifier.
pub fn peek_kind(buf: &[u8]) -> Option<DocumentKind> {
    let root = read_u32_le(buf, 0).ok()? as usize;
    if root >= buf.len() {
        return None;
    }
    slice_at(buf, 4, 4)
        .ok()
        .and_then(DocumentKind::from_file_identifier)
}

/// Decode a buffer produced for `kind`.
///
/// Untagged buffers (as written by flatbuffers builders that skip the file
/// identifier) are accepted; a buffer tagged for another kind is not.
pub fn decode(kind: DocumentKind, buf: &[u8]) -> Result<DocumentPropertiesModel> {
    check_kind(kind, buf, false)?;
    read_model(buf)
}

/// Like [`decode`], but the buffer must carry `kind`'s file identifier.
pub fn decode_strict(kind: DocumentKind, buf: &[u8]) -> Result<DocumentPropertiesModel> {
    check_kind(kind, buf, true)?;
    read_model(buf)
}

fn check_kind(kind: DocumentKind, buf: &[u8], require_identifier: bool) -> Result<()> {
    match peek_kind(buf) {
        Some(found) if found != kind => Err(Error::KindMismatch {
            expected: kind,
            found,
        }),
        Some(_) => Ok(()),
        None if require_identifier => Err(Error::Decode(format!(
            "buffer is missing the {} file identifier",
            kind.file_identifier()
        ))),
        None => Ok(()),
    }
}

fn read_model(buf: &[u8]) -> Result<DocumentPropertiesModel> {
    let root = flatbuffers::root::<PropertiesModel>(buf)?;
    if root.field_count() > PropertiesModel::FIELD_COUNT {
        tracing::trace!(
            fields = root.field_count(),
            known = PropertiesModel::FIELD_COUNT,
            "ignoring properties fields from a newer writer"
        );
    }
    let core = match root.settings() {
        Some(settings) => {
            if settings.field_count() > SettingsModel::FIELD_COUNT {
                tracing::trace!(
                    fields = settings.field_count(),
                    known = SettingsModel::FIELD_COUNT,
                    "ignoring settings fields from a newer writer"
                );
            }
            settings.to_core()
        },
        None => CoreProperties::default(),
    };
    Ok(DocumentPropertiesModel {
        is_in_memory: root.is_in_memory(),
        is_editable: root.is_editable(),
        core,
    })
}
