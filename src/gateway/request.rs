//! Creation requests.

use bytes::Bytes;

use crate::common::{DocumentKind, Error, Result};
use crate::properties::{self, DocumentPropertiesModel};

/// A single `create` call: built, sent once, discarded.
#[derive(Debug, Clone)]
pub struct CreationRequest {
    /// Entry point the request came through.
    pub kind: DocumentKind,
    pub file_name: String,
    pub properties_buffer: Bytes,
    /// Length the caller claims `properties_buffer` has.
    pub buffer_size: usize,
}

impl CreationRequest {
    /// Request with `buffer_size` taken from the buffer itself.
    pub fn new(kind: DocumentKind, file_name: impl Into<String>, buffer: impl Into<Bytes>) -> Self {
        let properties_buffer = buffer.into();
        Self {
            kind,
            file_name: file_name.into(),
            buffer_size: properties_buffer.len(),
            properties_buffer,
        }
    }

    /// Encode `properties` for `kind` and wrap them in a request.
    pub fn from_properties(
        kind: DocumentKind,
        file_name: impl Into<String>,
        properties: &DocumentPropertiesModel,
    ) -> Result<Self> {
        let buffer = properties::encode(kind, properties)?;
        Ok(Self::new(kind, file_name, buffer))
    }

    /// Override the declared size, as a C caller passing a separate length would.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Shape checks that need no decoding.
    pub(crate) fn validate(&self, max_buffer_size: usize) -> Result<()> {
        if self.file_name.is_empty() {
            return Err(Error::InvalidArgument("file name is empty".to_string()));
        }
        if self.properties_buffer.len() != self.buffer_size {
            return Err(Error::InvalidArgument(format!(
                "buffer_size {} does not match the {}-byte properties buffer",
                self.buffer_size,
                self.properties_buffer.len()
            )));
        }
        if self.properties_buffer.is_empty() {
            return Err(Error::InvalidArgument(
                "properties buffer is empty".to_string(),
            ));
        }
        if self.properties_buffer.len() > max_buffer_size {
            return Err(Error::InvalidArgument(format!(
                "properties buffer of {} bytes exceeds the {}-byte limit",
                self.properties_buffer.len(),
                max_buffer_size
            )));
        }
        Ok(())
    }
}
