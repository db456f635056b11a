//! Password trial and in-place rewrite of protected PDFs.

use crate::processor::OutcomeError;
use crate::{PasswordList, PreconsumeError, Result};
use log::{debug, info, warn};
use lopdf::encryption::DecryptionError;
use lopdf::{Document, Object, StringFormat};
use md5::{Digest, Md5};
use std::path::Path;

/// Result of one [`unlock`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnlockReport {
    /// `true` once a password opened the document and the rewrite landed on
    /// disk.
    pub succeeded: bool,

    /// Number of decryption trials made, one per candidate tried.
    pub attempts: usize,

    /// Trial failures other than a wrong password, and rewrite failures.
    pub errors: Vec<OutcomeError>,
}

/// Try each password in order against the PDF at `path`.
///
/// On the first password that opens the document, the decrypted document is
/// written back over `path` with a deterministic `/ID` and no further
/// passwords are tried. When no password works the file is left untouched.
///
/// This overwrites the input in place without a backup.
pub fn unlock<P: AsRef<Path>>(path: P, passwords: &PasswordList) -> UnlockReport {
    let path = path.as_ref();
    let mut report = UnlockReport::default();

    for password in passwords.iter() {
        report.attempts += 1;

        let mut document = match open_with_password(path, password) {
            Ok(document) => document,
            Err(PreconsumeError::WrongPassword) => {
                debug!("Trial {} did not open {}", report.attempts, path.display());
                continue;
            }
            Err(e) => {
                warn!("Trial {} on {} failed: {e}", report.attempts, path.display());
                report.errors.push(OutcomeError::new(
                    format!("decryption trial {}", report.attempts),
                    &e,
                ));
                continue;
            }
        };

        info!("Document {} was decrypted successfully", path.display());
        match rewrite_in_place(&mut document, path) {
            Ok(()) => report.succeeded = true,
            Err(e) => {
                warn!("Could not save decrypted {}: {e}", path.display());
                report.errors.push(OutcomeError::new("save decrypted document", &e));
            }
        }
        // The document is dropped here; later checks must reopen the file.
        return report;
    }

    if passwords.is_empty() {
        warn!("Password list is empty; {} stays encrypted", path.display());
    } else {
        let exhausted = PreconsumeError::DecryptionExhausted {
            attempts: report.attempts,
        };
        warn!("{}: {exhausted}", path.display());
    }
    report
}

/// One decryption trial. A wrong password is reported as
/// [`PreconsumeError::WrongPassword`]; everything else as
/// [`PreconsumeError::CorruptOrUnreadableDocument`].
fn open_with_password(path: &Path, password: &str) -> Result<Document> {
    let document = match Document::load_with_password(path, password) {
        Ok(document) => document,
        Err(e) if is_wrong_password(&e) => return Err(PreconsumeError::WrongPassword),
        Err(e) => return Err(PreconsumeError::CorruptOrUnreadableDocument(e)),
    };

    // lopdf falls back to the empty user password, which opens
    // owner-password-only documents whatever the candidate was.
    if !candidate_authenticates(path, password)? {
        return Err(PreconsumeError::WrongPassword);
    }
    Ok(document)
}

/// Whether `password` is the user or the owner password of the document.
fn candidate_authenticates(path: &Path, password: &str) -> Result<bool> {
    match Document::load(path)?.authenticate_password(password) {
        Ok(_) => Ok(true),
        Err(e) if is_wrong_password(&e) => Ok(false),
        Err(e) => Err(PreconsumeError::CorruptOrUnreadableDocument(e)),
    }
}

fn is_wrong_password(error: &lopdf::Error) -> bool {
    matches!(
        error,
        lopdf::Error::InvalidPassword
            | lopdf::Error::Decryption(DecryptionError::IncorrectPassword)
    )
}

/// Serialise `document` unencrypted with a deterministic `/ID` and replace
/// the file at `path`. The file is only written once serialisation
/// succeeded.
fn rewrite_in_place(document: &mut Document, path: &Path) -> Result<()> {
    let bytes = serialize_with_deterministic_id(document)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Serialise `document` without its security handler. Both halves of the
/// trailer `/ID` become the MD5 digest of the serialisation made without an
/// `/ID`, so identical content always yields identical bytes.
pub fn serialize_with_deterministic_id(document: &mut Document) -> Result<Vec<u8>> {
    document.trailer.remove(b"Encrypt");
    document.encryption_state = None;
    document.trailer.remove(b"ID");

    let mut unstamped = Vec::new();
    document.save_to(&mut unstamped)?;
    let digest = Md5::digest(&unstamped).to_vec();

    document.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(digest.clone(), StringFormat::Hexadecimal),
            Object::String(digest, StringFormat::Hexadecimal),
        ]),
    );

    let mut stamped = Vec::with_capacity(unstamped.len() + 80);
    document.save_to(&mut stamped)?;
    Ok(stamped)
}
