use crate::{PreconsumeError, Result};
use std::path::Path;

// ── Attachment ───────────────────────────────────────────────────────────────

/// A file embedded inside a PDF document, fully read into memory.
///
/// The bytes are copied out of the document while it is open, so an
/// `Attachment` outlives the document it came from.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// The filename as declared in the PDF file specification object
    /// (Unicode name preferred over ASCII name when both are present).
    pub filename: String,

    /// The decoded file content.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Returns the file extension, or `None` if the filename has no
    /// extension.
    ///
    /// ```
    /// # use pdf_preconsume::Attachment;
    /// # let file = Attachment { filename: "scan.PDF".into(), data: vec![] };
    /// assert_eq!(file.extension(), Some("PDF"));
    /// ```
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
    }

    /// Returns `true` when the file's extension matches `ext`
    /// (case-insensitive comparison).
    pub fn has_extension(&self, ext: &str) -> bool {
        self.extension()
            .map(|e| e.eq_ignore_ascii_case(ext))
            .unwrap_or(false)
    }

    /// Returns `true` for a `.pdf` filename, in any letter case.
    pub fn is_pdf(&self) -> bool {
        self.has_extension("pdf")
    }
}

/// Returns `true` when `path` has a `.pdf` extension (case-insensitive).
pub fn is_pdf_name<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Like [`is_pdf_name`], but reports a non-PDF path as
/// [`PreconsumeError::NotAPdf`].
pub fn ensure_pdf_name<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if is_pdf_name(path) {
        Ok(())
    } else {
        Err(PreconsumeError::NotAPdf(path.to_path_buf()))
    }
}
