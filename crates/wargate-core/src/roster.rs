//! The shared roster file, behind its exclusive lock.
//!
//! Every invocation of the gate, from every account, funnels through one
//! flat file. [`Roster::open_locked`] opens it read-write and takes a
//! blocking whole-file `flock(LOCK_EX)`; the returned guard holds the lock
//! for the rest of the operation and releases it exactly once when dropped,
//! unlock before close, on success and failure paths alike. That lock is
//! the only concurrency mechanism in the program: it totally orders every
//! scan-and-append against every other invocation on the same file.
//!
//! The scan itself is a deliberate linear pass in insertion order. The
//! first decisive record wins, which keeps diagnostics deterministic; do
//! not replace it with a set lookup.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use nix::fcntl::{Flock, FlockArg};
use tracing::debug;
use wargate_error::{Result, WargateError};

use crate::record::{Record, parse_row};

/// Verdicts a scan can reach without failing the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// No record shares an account, origin, or handle with the candidate.
    Clear,
    /// The caller's account is already on the roster from this same
    /// address. Benign: the stored handle (which may differ from the one
    /// just requested) stays authoritative.
    AlreadyRegistered { handle: String },
}

/// An open roster with the exclusive lock held.
///
/// Dropping the guard unlocks and then closes the file, so every return
/// path out of a registration releases the lock exactly once.
#[derive(Debug)]
pub struct Roster {
    file: Flock<File>,
    path: PathBuf,
}

impl Roster {
    /// Open the roster read-write and block until the exclusive lock is
    /// ours.
    ///
    /// The file must already exist: a missing roster means the arena is
    /// not provisioned, and this program never creates or truncates it.
    pub fn open_locked(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| WargateError::StoreOpen {
                path: path.to_owned(),
                source,
            })?;

        debug!(path = %path.display(), "waiting for exclusive roster lock");
        let file = Flock::lock(file, FlockArg::LockExclusive)
            .map_err(|(_, errno)| WargateError::Lock {
                source: errno.into(),
            })?;
        debug!(path = %path.display(), "roster locked");

        Ok(Self {
            file,
            path: path.to_owned(),
        })
    }

    /// Walk existing records in insertion order and apply the conflict
    /// policy to `candidate`:
    ///
    /// 1. same account, same origin: benign re-registration; any new
    ///    handle is discarded and the stored one stands;
    /// 2. same account, different origin: refused, the diagnostic names
    ///    where the account is registered;
    /// 3. same origin, different account: refused;
    /// 4. same handle: refused.
    ///
    /// The first decisive record terminates the scan. A line with fewer
    /// than three tokens ends the scan silently: a truncated trailing row
    /// is end of usable data, not an error.
    pub fn scan(&mut self, candidate: &Record) -> Result<ScanOutcome> {
        let mut reader = BufReader::new(&*self.file);
        let mut line = String::new();
        let mut rows = 0usize;

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            let Some((account, origin, handle)) = parse_row(&line) else {
                debug!(rows, "short row ends the scan");
                break;
            };
            rows += 1;

            if account == candidate.account.as_str() {
                if origin == candidate.origin.as_str() {
                    debug!(stored_handle = handle, "account already registered here");
                    return Ok(ScanOutcome::AlreadyRegistered {
                        handle: handle.to_owned(),
                    });
                }
                return Err(WargateError::AlreadyRegisteredElsewhere {
                    origin: origin.to_owned(),
                });
            }
            if origin == candidate.origin.as_str() {
                return Err(WargateError::OriginConflict {
                    origin: origin.to_owned(),
                });
            }
            if handle == candidate.handle.as_str() {
                return Err(WargateError::HandleTaken {
                    handle: handle.to_owned(),
                });
            }
        }

        debug!(rows, "scan clear");
        Ok(ScanOutcome::Clear)
    }

    /// Append `record` as one line at the end of the file and sync it to
    /// disk while the lock is still held.
    pub fn append(&mut self, record: &Record) -> Result<()> {
        let file: &mut File = &mut self.file;
        file.seek(SeekFrom::End(0))?;
        writeln!(file, "{record}")?;
        file.sync_data()?;
        debug!(path = %self.path.display(), "registration appended");
        Ok(())
    }

    /// Where this roster lives.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
