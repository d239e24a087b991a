//! Document kind tags.
//!
//! The three kinds share one properties layout. They differ only in the
//! 4-byte file identifier written into the buffer and in the entry point
//! used to create them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Kind of document a properties buffer or handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DocumentKind {
    /// Word processing document (.docx)
    Word = 0,
    /// Presentation (.pptx)
    Presentation = 1,
    /// Spreadsheet (.xlsx)
    Spreadsheet = 2,
}

impl DocumentKind {
    /// All kinds, in tag order.
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::Word,
        DocumentKind::Presentation,
        DocumentKind::Spreadsheet,
    ];

    /// File identifier stored at bytes 4..8 of an encoded buffer.
    pub const fn file_identifier(self) -> &'static str {
        match self {
            DocumentKind::Word => "WDPM",
            DocumentKind::Presentation => "PPPM",
            DocumentKind::Spreadsheet => "XLPM",
        }
    }

    /// Look a kind up by its file identifier.
    pub fn from_file_identifier(ident: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.file_identifier().as_bytes() == ident)
    }

    /// Numeric tag used by the C ABI.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Conventional OOXML extension, without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            DocumentKind::Word => "docx",
            DocumentKind::Presentation => "pptx",
            DocumentKind::Spreadsheet => "xlsx",
        }
    }

    /// Guess the kind from a file name's extension (case-insensitive).
    ///
    /// Macro-enabled and template variants map to the same kind.
    ///
    /// ```
    /// use longan::DocumentKind;
    /// assert_eq!(DocumentKind::from_path("Book1.XLSX"), Some(DocumentKind::Spreadsheet));
    /// assert_eq!(DocumentKind::from_path("deck.potx"), Some(DocumentKind::Presentation));
    /// assert_eq!(DocumentKind::from_path("notes.txt"), None);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "docx" | "docm" | "dotx" | "dotm" => Some(DocumentKind::Word),
            "pptx" | "pptm" | "potx" | "potm" | "ppsx" => Some(DocumentKind::Presentation),
            "xlsx" | "xlsm" | "xltx" | "xltm" => Some(DocumentKind::Spreadsheet),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Word => "Word",
            DocumentKind::Presentation => "PowerPoint",
            DocumentKind::Spreadsheet => "Excel",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_are_distinct_and_reversible() {
        for kind in DocumentKind::ALL {
            let ident = kind.file_identifier();
            assert_eq!(ident.len(), 4);
            assert_eq!(DocumentKind::from_file_identifier(ident.as_bytes()), Some(kind));
        }
        assert_eq!(DocumentKind::from_file_identifier(b"ABCD"), None);
        assert_eq!(DocumentKind::from_file_identifier(b"WD"), None);
    }

    #[test]
    fn test_tags() {
        assert_eq!(DocumentKind::from_tag(0), Some(DocumentKind::Word));
        assert_eq!(DocumentKind::from_tag(2), Some(DocumentKind::Spreadsheet));
        assert_eq!(DocumentKind::from_tag(3), None);
        assert_eq!(DocumentKind::Presentation as u8, 1);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(DocumentKind::from_path("a/b/report.docx"), Some(DocumentKind::Word));
        assert_eq!(DocumentKind::from_path("book1.xlsm"), Some(DocumentKind::Spreadsheet));
        assert_eq!(DocumentKind::from_path("noext"), None);
    }
}
