//! The registration operation, end to end.
//!
//! One call: lock the roster, scan it, and either append the caller's
//! record or refuse. The roster guard is scoped to this function, so every
//! path out releases the lock exactly once, whether the attempt appended,
//! turned out benign, or failed.

use std::path::Path;

use tracing::info;
use wargate_error::Result;

use crate::record::{Record, Token};
use crate::roster::{Roster, ScanOutcome};
use crate::session::Session;

/// How a registration attempt ended without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The record was appended; `origin` is the confirmation the caller
    /// gets on stdout.
    Recorded { origin: Token },
    /// The account was already registered from this address. Nothing was
    /// written; `handle` is the stored handle that remains in force.
    AlreadyRegistered { origin: Token, handle: String },
}

/// Register `handle` for the resolved session against the roster at
/// `roster_path`.
///
/// Exclusion, scan order, and the conflict policy are documented on
/// [`Roster`]; this function only strings the steps together and maps the
/// scan verdict to an outcome.
pub fn register(roster_path: &Path, session: &Session, handle: &Token) -> Result<Registration> {
    let candidate = Record::new(
        session.account.clone(),
        session.origin.clone(),
        handle.clone(),
    );

    let mut roster = Roster::open_locked(roster_path)?;
    match roster.scan(&candidate)? {
        ScanOutcome::AlreadyRegistered { handle } => Ok(Registration::AlreadyRegistered {
            origin: candidate.origin,
            handle,
        }),
        ScanOutcome::Clear => {
            roster.append(&candidate)?;
            info!(
                roster = %roster.path().display(),
                account = %candidate.account,
                origin = %candidate.origin,
                handle = %candidate.handle,
                "handle registered"
            );
            Ok(Registration::Recorded {
                origin: candidate.origin,
            })
        }
    }
}
