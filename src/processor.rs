//! Per-file pipeline: inspect, decrypt, re-inspect, extract.

use crate::{
    decryptor, ensure_pdf_name, extractor, inspector, is_pdf_name, PasswordList, PipelineConfig,
    PreconsumeError, Result,
};
use log::{info, warn};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable naming the target path; wins over the command line.
pub const TARGET_ENV: &str = "DOCUMENT_WORKING_PATH";

/// Environment variable carrying the pipeline's task id for log correlation.
pub const TASK_ID_ENV: &str = "TASK_ID";

/// Pick the target path: the environment value first, then the argument.
/// Empty values count as absent.
pub fn resolve_target(env_value: Option<OsString>, arg: Option<PathBuf>) -> Result<PathBuf> {
    env_value
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| arg.filter(|p| !p.as_os_str().is_empty()))
        .ok_or(PreconsumeError::TargetUnresolved)
}

// ── Outcomes ─────────────────────────────────────────────────────────────────

/// A failure confined to one unit of work, kept for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeError {
    /// What was being attempted, e.g. `"decryption trial 2"`.
    pub context: String,
    pub message: String,
}

impl OutcomeError {
    pub fn new(context: impl Into<String>, error: &dyn fmt::Display) -> Self {
        Self {
            context: context.into(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for OutcomeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// The path went through the pipeline.
    Processed,
    /// The path has no `.pdf` extension; nothing was attempted.
    SkippedNotPdf,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOutcome {
    pub path: PathBuf,
    pub status: FileStatus,
    pub was_encrypted: bool,
    /// `None` when decryption was not attempted.
    pub decryption_succeeded: Option<bool>,
    pub decryption_attempts: usize,
    pub attachments_found: usize,
    pub attachments_extracted: usize,
    pub attachments_skipped: usize,
    pub attachments_failed: usize,
    pub errors: Vec<OutcomeError>,
}

impl ProcessingOutcome {
    fn new(path: &Path, status: FileStatus) -> Self {
        Self {
            path: path.to_path_buf(),
            status,
            was_encrypted: false,
            decryption_succeeded: None,
            decryption_attempts: 0,
            attachments_found: 0,
            attachments_extracted: 0,
            attachments_skipped: 0,
            attachments_failed: 0,
            errors: Vec::new(),
        }
    }
}

/// Outcomes of every file handled in one run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<ProcessingOutcome>,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == FileStatus::Processed)
            .count()
    }

    pub fn decrypted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.decryption_succeeded == Some(true))
            .count()
    }

    pub fn still_encrypted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.decryption_succeeded == Some(false))
            .count()
    }

    pub fn attachments_extracted(&self) -> usize {
        self.outcomes.iter().map(|o| o.attachments_extracted).sum()
    }

    pub fn error_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.errors.len()).sum()
    }
}

// ── FileProcessor ────────────────────────────────────────────────────────────

/// Log prefix carrying the task id, empty when there is none.
struct TaskTag<'a>(Option<&'a str>);

impl fmt::Display for TaskTag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(id) => write!(f, "[task {id}] "),
            None => Ok(()),
        }
    }
}

/// Runs the pipeline over single files or a directory of files.
///
/// The password list is read the first time a file turns out to be
/// encrypted and is reused, read-only, for every later file.
pub struct FileProcessor {
    config: PipelineConfig,
    passwords: Option<PasswordList>,
}

impl FileProcessor {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            passwords: None,
        }
    }

    /// Use `passwords` instead of reading the configured password file.
    pub fn with_passwords(config: PipelineConfig, passwords: PasswordList) -> Self {
        Self {
            config,
            passwords: Some(passwords),
        }
    }

    fn tag(&self) -> TaskTag<'_> {
        TaskTag(self.config.task_id.as_deref())
    }

    fn passwords(&mut self) -> Result<&PasswordList> {
        if self.passwords.is_none() {
            let list = PasswordList::load_with_fallback(
                &self.config.password_file,
                self.config.fallback_password_file.as_deref(),
            )?;
            self.passwords = Some(list);
        }
        Ok(self.passwords.get_or_insert_with(PasswordList::default))
    }

    /// Process a single file, or every `.pdf` directly inside a directory.
    ///
    /// Only an unreadable target or password source is returned as an
    /// error; every other failure is recorded in the file's outcome.
    pub fn process_target<P: AsRef<Path>>(&mut self, target: P) -> Result<RunSummary> {
        let target = target.as_ref();
        let metadata = std::fs::metadata(target).map_err(|source| {
            PreconsumeError::SourceUnavailable {
                path: target.to_path_buf(),
                source,
            }
        })?;

        let mut summary = RunSummary::default();
        if metadata.is_dir() {
            for file in Self::pdf_children(target)? {
                summary.outcomes.push(self.process_file(&file)?);
            }
        } else {
            summary.outcomes.push(self.process_file(target)?);
        }

        info!(
            "{}Run finished: {} processed, {} decrypted, {} still encrypted, {} attachment(s) extracted, {} error(s)",
            self.tag(),
            summary.processed(),
            summary.decrypted(),
            summary.still_encrypted(),
            summary.attachments_extracted(),
            summary.error_count()
        );
        Ok(summary)
    }

    /// Direct children of `dir` that are files with a `.pdf` extension,
    /// sorted by path.
    fn pdf_children(dir: &Path) -> Result<Vec<PathBuf>> {
        let unavailable = |source| PreconsumeError::SourceUnavailable {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(unavailable)? {
            let path = entry.map_err(unavailable)?.path();
            if path.is_file() && is_pdf_name(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Run the pipeline on one file.
    pub fn process_file<P: AsRef<Path>>(&mut self, path: P) -> Result<ProcessingOutcome> {
        let path = path.as_ref();

        if let Err(skip) = ensure_pdf_name(path) {
            info!("{}{skip}; skipping", self.tag());
            return Ok(ProcessingOutcome::new(path, FileStatus::SkippedNotPdf));
        }

        let mut outcome = ProcessingOutcome::new(path, FileStatus::Processed);

        if inspector::is_encrypted(path) {
            info!(
                "{}Document {} is encrypted. Proceeding with decryption",
                self.tag(),
                path.display()
            );
            outcome.was_encrypted = true;

            let report = decryptor::unlock(path, self.passwords()?);
            outcome.decryption_succeeded = Some(report.succeeded);
            outcome.decryption_attempts = report.attempts;
            outcome.errors.extend(report.errors);

            if !report.succeeded {
                warn!(
                    "{}No password is working for {}; continuing with attachments",
                    self.tag(),
                    path.display()
                );
            }
        } else {
            info!(
                "{}Document {} is not encrypted. Proceeding without decryption",
                self.tag(),
                path.display()
            );
        }

        // Reopened from disk: the decryptor may have rewritten the file.
        if inspector::has_attachments(path) {
            info!(
                "{}Document {} contains attachments. Proceeding with extracting the attachments",
                self.tag(),
                path.display()
            );
            self.run_extraction(path, &mut outcome);
        } else {
            info!("{}Document {} has no attachments", self.tag(), path.display());
        }

        Ok(outcome)
    }

    fn run_extraction(&self, path: &Path, outcome: &mut ProcessingOutcome) {
        match extractor::extract(path, &self.config.consume_dir, self.config.filename_policy) {
            Ok(report) => {
                outcome.attachments_found = report.found();
                outcome.attachments_extracted = report.extracted.len();
                outcome.attachments_skipped = report.skipped.len();
                outcome.attachments_failed = report.failed.len();
                outcome.errors.extend(
                    report
                        .failed
                        .into_iter()
                        .map(|(name, reason)| OutcomeError {
                            context: format!("attachment {name}"),
                            message: reason,
                        }),
                );
            }
            Err(e) => {
                warn!("{}Extraction from {} failed: {e}", self.tag(), path.display());
                outcome.errors.push(OutcomeError::new("open for extraction", &e));
            }
        }
    }
}
