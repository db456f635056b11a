//! Candidate password list.

use crate::{PreconsumeError, Result};
use log::{info, warn};
use std::path::Path;

/// Ordered, immutable list of candidate passwords.
///
/// Duplicates are kept; trying the same password twice is harmless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordList {
    passwords: Vec<String>,
}

impl PasswordList {
    /// Build a list from raw text: one password per line, surrounding
    /// whitespace trimmed, blank lines dropped, order preserved.
    pub fn parse(text: &str) -> Self {
        let passwords = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
        Self { passwords }
    }

    /// Read the whole file at `path` into a list.
    ///
    /// Any read failure (missing file, permission denied, invalid UTF-8) is
    /// [`PreconsumeError::SourceUnavailable`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading document passwords into memory from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| {
            PreconsumeError::SourceUnavailable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let list = Self::parse(&text);
        if list.is_empty() {
            warn!("Password file {} is empty", path.display());
        }
        Ok(list)
    }

    /// Like [`load`](Self::load), but tries `fallback` when `primary` cannot
    /// be read. The error of the last source tried is returned.
    pub fn load_with_fallback(primary: &Path, fallback: Option<&Path>) -> Result<Self> {
        match (Self::load(primary), fallback) {
            (Ok(list), _) => Ok(list),
            (Err(e), Some(fallback)) => {
                warn!("{e}; trying {}", fallback.display());
                Self::load(fallback)
            }
            (Err(e), None) => Err(e),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.passwords.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.passwords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passwords.is_empty()
    }
}

/// Entries are trimmed and blank ones dropped, as in [`PasswordList::parse`].
impl<S: Into<String>> FromIterator<S> for PasswordList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let passwords = iter
            .into_iter()
            .map(Into::into)
            .map(|p: String| p.trim().to_owned())
            .filter(|p| !p.is_empty())
            .collect();
        Self { passwords }
    }
}

impl From<Vec<String>> for PasswordList {
    fn from(passwords: Vec<String>) -> Self {
        passwords.into_iter().collect()
    }
}
