//! Read-only yes/no questions about a PDF on disk.
//!
//! Each call opens the file, answers, and drops the document before
//! returning, so the answer always reflects what is on disk right now.
//!
//! The two checks fail in opposite directions on purpose. A file that
//! cannot be opened is reported as *encrypted* (so decryption is still
//! attempted) but as having *no attachments* (so nothing is extracted from
//! it).

use crate::file_discovery::FileSpecDiscovery;
use log::debug;
use lopdf::Document;
use std::path::Path;

/// Returns `true` when the document carries a security handler.
///
/// lopdf opens owner-password-only documents transparently with the empty
/// user password; those still count as encrypted because the file on disk
/// is. A document that cannot be opened at all is reported as encrypted.
pub fn is_encrypted<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    match Document::load(path) {
        Ok(document) => document.is_encrypted() || document.encryption_state.is_some(),
        Err(e) => {
            debug!("{} could not be opened ({e}); assuming it is encrypted", path.display());
            true
        }
    }
}

/// Returns `true` when the document's embedded-file collection is non-empty.
/// A document that cannot be opened is reported as having none.
pub fn has_attachments<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    match Document::load(path) {
        Ok(document) => !FileSpecDiscovery::new(&document).collect_file_specs().is_empty(),
        Err(e) => {
            debug!("{} could not be opened ({e}); assuming no attachments", path.display());
            false
        }
    }
}
