//! # pdf-preconsume
//!
//! Pre-consumption step for a document-ingestion pipeline.
//!
//! ## What this crate does
//!
//! 1. **Detect encryption**: opens a PDF and asks whether it carries a
//!    security handler.
//! 2. **Remove protection**: tries every candidate password from a
//!    newline-delimited list, in order, and on the first success rewrites the
//!    file in place with a deterministic `/ID`.
//! 3. **Detect attachments**: walks the embedded-file name tree and page
//!    `FileAttachment` annotations.
//! 4. **Extract PDF attachments**: writes every attachment whose name ends in
//!    `.pdf` into the consume directory so it is ingested on its own.
//!
//! ## Quick example
//!
//! ```no_run
//! use pdf_preconsume::{FileProcessor, PipelineConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig {
//!     password_file: "passwords.txt".into(),
//!     consume_dir: "./consume".into(),
//!     ..Default::default()
//! };
//!
//! let mut processor = FileProcessor::new(config);
//! let summary = processor.process_target("inbox/")?;
//! println!("{} file(s) processed", summary.processed());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod decryptor;
mod embedded;
pub mod extractor;
mod file_discovery;
mod file_parsing;
pub mod inspector;
pub mod passwords;
mod pdf_utils;
pub mod processor;

pub use decryptor::{unlock, UnlockReport};
pub use embedded::{ensure_pdf_name, is_pdf_name, Attachment};
pub use extractor::{extract, ExtractionReport};
pub use inspector::{has_attachments, is_encrypted};
pub use passwords::PasswordList;
pub use processor::{resolve_target, FileProcessor, FileStatus, OutcomeError, ProcessingOutcome, RunSummary};

// ── Configuration ────────────────────────────────────────────────────────────

/// Conventional location of the candidate password list.
pub const DEFAULT_PASSWORD_FILE: &str = "/usr/src/paperless/scripts/passwords.txt";

/// Secondary password list, relative to the working directory.
pub const FALLBACK_PASSWORD_FILE: &str = "passwords.txt";

/// Conventional consume directory that extracted attachments are dropped into.
pub const DEFAULT_CONSUME_DIR: &str = "/usr/src/paperless/consume/";

/// How an attachment's stored filename becomes a path inside the consume
/// directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilenamePolicy {
    /// Keep only the final path component of the stored name. Names that
    /// reduce to nothing, `.` or `..` are rejected.
    #[default]
    Sanitize,

    /// Join the stored name onto the consume directory untouched. A stored
    /// name such as `../../etc/x.pdf` escapes the directory.
    Verbatim,
}

impl FilenamePolicy {
    /// Returns the destination path for `stored_name` inside `dir`, or `None`
    /// when the policy rejects the name.
    pub fn destination(self, dir: &Path, stored_name: &str) -> Option<PathBuf> {
        match self {
            FilenamePolicy::Verbatim => Some(dir.join(stored_name)),
            FilenamePolicy::Sanitize => {
                let base = stored_name
                    .rsplit(['/', '\\'])
                    .next()
                    .unwrap_or_default()
                    .trim();
                match base {
                    "" | "." | ".." => None,
                    name => Some(dir.join(name)),
                }
            }
        }
    }
}

/// Runtime configuration for [`FileProcessor`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Primary newline-delimited password list.
    pub password_file: PathBuf,

    /// Tried when [`password_file`](Self::password_file) cannot be read.
    pub fallback_password_file: Option<PathBuf>,

    /// Directory that extracted PDF attachments are written into.
    pub consume_dir: PathBuf,

    /// See [`FilenamePolicy`].
    pub filename_policy: FilenamePolicy,

    /// Task identifier of the surrounding pipeline, used only to tag log lines.
    pub task_id: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            password_file: PathBuf::from(DEFAULT_PASSWORD_FILE),
            fallback_password_file: Some(PathBuf::from(FALLBACK_PASSWORD_FILE)),
            consume_dir: PathBuf::from(DEFAULT_CONSUME_DIR),
            filename_policy: FilenamePolicy::default(),
            task_id: None,
        }
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

/// Every error that this crate can produce.
#[derive(Error, Debug)]
pub enum PreconsumeError {
    /// The password list or the target path is missing or unreadable.
    #[error("source unavailable: {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Neither the environment nor the command line named a target path.
    #[error("no target path given (set DOCUMENT_WORKING_PATH or pass a path)")]
    TargetUnresolved,

    /// The path does not carry a `.pdf` extension.
    #[error("not a PDF file: {}", .0.display())]
    NotAPdf(PathBuf),

    /// lopdf could not open or parse the document.
    #[error("corrupt or unreadable document: {0}")]
    CorruptOrUnreadableDocument(#[from] lopdf::Error),

    /// The candidate password did not open the document.
    #[error("wrong password")]
    WrongPassword,

    /// Every candidate password was tried without success.
    #[error("no candidate password opened the document ({attempts} tried)")]
    DecryptionExhausted { attempts: usize },

    /// An attachment record could not be resolved to a name and a stream.
    #[error("failed to resolve attachment '{name}': {reason}")]
    AttachmentResolution { name: String, reason: String },

    /// An attachment was resolved but could not be written.
    #[error("failed to write attachment '{name}': {source}")]
    AttachmentWrite {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A filesystem I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, PreconsumeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_last_component() {
        let dir = Path::new("/consume");
        let policy = FilenamePolicy::Sanitize;
        assert_eq!(
            policy.destination(dir, "../../etc/evil.pdf"),
            Some(PathBuf::from("/consume/evil.pdf"))
        );
        assert_eq!(
            policy.destination(dir, r"C:\docs\scan.pdf"),
            Some(PathBuf::from("/consume/scan.pdf"))
        );
        assert_eq!(policy.destination(dir, ".."), None);
        assert_eq!(policy.destination(dir, "dir/"), None);
    }

    #[test]
    fn verbatim_joins_as_is() {
        let dir = Path::new("/consume");
        assert_eq!(
            FilenamePolicy::Verbatim.destination(dir, "sub/report.pdf"),
            Some(PathBuf::from("/consume/sub/report.pdf"))
        );
    }

    #[test]
    fn default_config_uses_conventional_paths() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.password_file, PathBuf::from(DEFAULT_PASSWORD_FILE));
        assert_eq!(cfg.consume_dir, PathBuf::from(DEFAULT_CONSUME_DIR));
        assert_eq!(cfg.filename_policy, FilenamePolicy::Sanitize);
        assert!(cfg.task_id.is_none());
    }
}
