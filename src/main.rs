//! Pre-consumption command for a document-ingestion pipeline.
//!
//! Decrypts password-protected PDFs in place and drops their embedded PDF
//! attachments into the consume directory.

use anyhow::Context;
use clap::Parser;
use log::info;
use pdf_preconsume::processor::{TARGET_ENV, TASK_ID_ENV};
use pdf_preconsume::{resolve_target, FileProcessor, FilenamePolicy, PipelineConfig};
use std::env;
use std::path::PathBuf;

/// Remove PDF password protection and extract embedded PDF attachments.
#[derive(Debug, Parser)]
#[command(name = "pdf-preconsume", about, version)]
struct Cli {
    /// PDF file or directory of PDFs. DOCUMENT_WORKING_PATH takes precedence
    #[arg(value_name = "TARGET")]
    target: Option<PathBuf>,

    /// Newline-delimited list of candidate passwords
    #[arg(long, value_name = "FILE", default_value = pdf_preconsume::DEFAULT_PASSWORD_FILE)]
    passwords: PathBuf,

    /// Password list tried when --passwords cannot be read
    #[arg(long, value_name = "FILE", default_value = pdf_preconsume::FALLBACK_PASSWORD_FILE)]
    fallback_passwords: PathBuf,

    /// Directory that extracted PDF attachments are written into
    #[arg(long, value_name = "DIR", default_value = pdf_preconsume::DEFAULT_CONSUME_DIR)]
    consume_dir: PathBuf,

    /// Use attachment filenames exactly as stored, including any directory parts
    #[arg(long)]
    trust_attachment_names: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let task_id = env::var(TASK_ID_ENV).ok().filter(|id| !id.is_empty());
    info!(
        "Kicking off pre-consumption script for task {}",
        task_id.as_deref().unwrap_or("-")
    );

    let target = resolve_target(env::var_os(TARGET_ENV), cli.target)?;

    let config = PipelineConfig {
        password_file: cli.passwords,
        fallback_password_file: Some(cli.fallback_passwords),
        consume_dir: cli.consume_dir,
        filename_policy: if cli.trust_attachment_names {
            FilenamePolicy::Verbatim
        } else {
            FilenamePolicy::Sanitize
        },
        task_id,
    };

    FileProcessor::new(config)
        .process_target(&target)
        .with_context(|| format!("processing {} aborted", target.display()))?;

    Ok(())
}
