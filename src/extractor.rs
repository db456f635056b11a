//! Extraction of embedded PDF attachments into a destination directory.

use crate::file_discovery::FileSpecDiscovery;
use crate::file_parsing::FileSpecParser;
use crate::{Attachment, FilenamePolicy, PreconsumeError, Result};
use log::{info, warn};
use lopdf::Document;
use std::path::Path;

/// Reason recorded for attachments filtered out by extension.
pub const SKIP_NOT_PDF: &str = "not a PDF";

/// Per-attachment outcome of one [`extract`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Stored filenames of attachments written to the destination.
    pub extracted: Vec<String>,

    /// `(filename, reason)` for attachments deliberately not written.
    pub skipped: Vec<(String, String)>,

    /// `(filename, reason)` for attachments that could not be resolved or
    /// written.
    pub failed: Vec<(String, String)>,
}

impl ExtractionReport {
    /// Number of entries in the attachment collection.
    pub fn found(&self) -> usize {
        self.extracted.len() + self.skipped.len() + self.failed.len()
    }
}

/// Write every `.pdf` attachment of the document at `path` into
/// `destination`.
///
/// A broken attachment record or a failed write is recorded and extraction
/// moves on to the next attachment. Attachments sharing a name overwrite
/// each other; the last one wins. Only failing to open the document at all
/// is returned as an error.
pub fn extract<P, D>(path: P, destination: D, policy: FilenamePolicy) -> Result<ExtractionReport>
where
    P: AsRef<Path>,
    D: AsRef<Path>,
{
    let document = Document::load(path.as_ref())?;
    Ok(ExtractionEngine::new(&document, destination.as_ref(), policy).run())
}

/// Walks one open document's attachment collection.
struct ExtractionEngine<'a> {
    document: &'a Document,
    destination: &'a Path,
    policy: FilenamePolicy,
}

impl<'a> ExtractionEngine<'a> {
    fn new(document: &'a Document, destination: &'a Path, policy: FilenamePolicy) -> Self {
        Self {
            document,
            destination,
            policy,
        }
    }

    fn run(&self) -> ExtractionReport {
        let parser = FileSpecParser::new(self.document);
        let mut report = ExtractionReport::default();

        for entry in FileSpecDiscovery::new(self.document).collect_file_specs() {
            let attachment = match parser.parse(&entry) {
                Ok(attachment) => attachment,
                Err(e) => {
                    warn!("Attachment '{}' could not be resolved: {e}", entry.name);
                    report.failed.push((entry.name, e.to_string()));
                    continue;
                }
            };

            if !attachment.is_pdf() {
                info!(
                    "Attachment {} skipped, because it is not a PDF file",
                    attachment.filename
                );
                report.skipped.push((attachment.filename, SKIP_NOT_PDF.into()));
                continue;
            }

            match self.write_attachment(&attachment) {
                Ok(()) => report.extracted.push(attachment.filename),
                Err(e) => {
                    warn!("{e}");
                    report.failed.push((attachment.filename, e.to_string()));
                }
            }
        }

        report
    }

    fn write_attachment(&self, attachment: &Attachment) -> Result<()> {
        let write_error = |source| PreconsumeError::AttachmentWrite {
            name: attachment.filename.clone(),
            source,
        };

        let dest = self
            .policy
            .destination(self.destination, &attachment.filename)
            .ok_or_else(|| {
                write_error(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "filename has no usable final component",
                ))
            })?;

        std::fs::create_dir_all(self.destination).map_err(write_error)?;
        std::fs::write(&dest, &attachment.data).map_err(write_error)?;
        info!("Attachment {} saved", dest.display());
        Ok(())
    }
}
