//! Hosts file block ledger
//!
//! Every line this service owns carries the marker `# <token>`. Lines without
//! the marker are never touched.
//!
//! - Add appends the missing entries with the file's own line ending (CRLF if
//!   any CRLF is present, LF otherwise) and never rewrites the file.
//! - Remove rewrites the whole file in place without tagged lines, joined
//!   with CRLF.
//!
//! Calls on one ledger are serialized by its mutex. Other processes editing
//! the file concurrently are not coordinated with: last writer wins.

use std::{
    collections::HashSet,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};
use thiserror::Error;
use tracing::{debug, info};

/// Address every blocked hostname is pointed at
pub const BLOCK_ADDRESS: &str = "127.0.0.1";

const CRLF: &[u8] = b"\r\n";
const LF: &[u8] = b"\n";

/// Errors raised while editing the hosts file
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("hosts file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LedgerError {
    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        LedgerError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Owner of the tagged block entries in one hosts file
#[derive(Debug)]
pub struct HostLedger {
    path: PathBuf,
    token: String,
    /// Hostnames the next add should block. Also serializes file access.
    sites: Mutex<Vec<String>>,
}

impl HostLedger {
    pub fn new(path: impl Into<PathBuf>, token: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            token: token.into(),
            sites: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Comment that tags owned lines
    pub fn marker(&self) -> String {
        format!("# {}", self.token)
    }

    /// The exact line written for `site`
    pub fn entry_for(&self, site: &str) -> String {
        format!("{}\t{}\t{}", BLOCK_ADDRESS, site, self.marker())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.sites.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the desired site set, dropping duplicates and keeping order
    pub fn set_sites<I, S>(&self, sites: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let deduped: Vec<String> = sites
            .into_iter()
            .map(Into::into)
            .filter(|site| seen.insert(site.clone()))
            .collect();
        *self.lock() = deduped;
    }

    pub fn sites(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Append an entry for every desired site that is not already present.
    ///
    /// A missing file counts as empty and is created. Existing entries are
    /// matched as whole lines, so a tagged line with different spacing or
    /// address does not count and gets a second entry next to it.
    ///
    /// Returns the number of lines appended.
    pub fn add_block_entries(&self) -> Result<usize, LedgerError> {
        let sites = self.lock();

        let input = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist yet, treating as empty", self.path.display());
                Vec::new()
            }
            Err(e) => return Err(LedgerError::io("read", &self.path, e)),
        };

        let newline = detect_line_ending(&input);
        let marker = self.marker();
        let existing: HashSet<&[u8]> = split_lines(&input)
            .filter(|line| contains(line, marker.as_bytes()))
            .collect();

        let entries: Vec<String> = sites
            .iter()
            .map(|site| self.entry_for(site))
            .filter(|entry| !existing.contains(entry.as_bytes()))
            .collect();

        if entries.is_empty() {
            debug!("All {} sites already blocked in {}", sites.len(), self.path.display());
            return Ok(0);
        }

        let mut output = Vec::new();
        if !input.is_empty() && !input.ends_with(LF) {
            output.extend_from_slice(newline);
        }
        for entry in &entries {
            output.extend_from_slice(entry.as_bytes());
            output.extend_from_slice(newline);
        }

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| LedgerError::io("open", &self.path, e))?;
        file.write_all(&output)
            .and_then(|()| file.flush())
            .map_err(|e| LedgerError::io("append to", &self.path, e))?;

        info!("Blocked {} sites in {}", entries.len(), self.path.display());
        Ok(entries.len())
    }

    /// Drop every tagged line and rewrite the file with CRLF line endings.
    ///
    /// A missing file is an error here, unlike in add. Returns the number of
    /// lines removed; calling again with nothing tagged still rewrites the file.
    pub fn remove_block_entries(&self) -> Result<usize, LedgerError> {
        let _guard = self.lock();

        let input = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LedgerError::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(e) => return Err(LedgerError::io("read", &self.path, e)),
        };

        let marker = self.marker();
        let mut removed = 0;
        let kept: Vec<&[u8]> = split_lines(&input)
            .filter(|line| {
                let tagged = contains(line, marker.as_bytes());
                if tagged {
                    removed += 1;
                }
                !tagged
            })
            .collect();

        let mut output = kept.join(CRLF);
        if !output.ends_with(CRLF) {
            output.extend_from_slice(CRLF);
        }

        // In place: a symlinked hosts file stays a link and keeps its ACLs
        fs::write(&self.path, &output)
            .map_err(|e| LedgerError::io("rewrite", &self.path, e))?;

        info!("Removed {} blocked entries from {}", removed, self.path.display());
        Ok(removed)
    }

    /// Tagged lines currently in the file, without line endings
    pub fn tagged_lines(&self) -> Result<Vec<String>, LedgerError> {
        let _guard = self.lock();
        let input = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LedgerError::io("read", &self.path, e)),
        };
        let marker = self.marker();
        Ok(split_lines(&input)
            .filter(|line| contains(line, marker.as_bytes()))
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect())
    }
}

fn detect_line_ending(content: &[u8]) -> &'static [u8] {
    if contains(content, CRLF) {
        CRLF
    } else {
        LF
    }
}

/// Split on LF and strip one trailing CR from each piece
fn split_lines(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    content
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}
