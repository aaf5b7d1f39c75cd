//! Error taxonomy for the wargate registration gate.
//!
//! One enum covers every way an invocation can fail, from argument handling
//! through conflict detection. The `Display` strings double as the
//! diagnostics the `register` binary prints to stderr, so they are written
//! for the person at the keyboard, not for a log pipeline.
//!
//! The benign "already registered from this same address" outcome is *not*
//! here: it exits zero and is modeled as a success variant by
//! `wargate-core`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, WargateError>;

/// Why a string was rejected as a roster token.
///
/// Tokens are bounded fields; the bound is enforced by validation rather
/// than by silent truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenViolation {
    /// Empty tokens would produce unreadable roster lines.
    #[error("must not be empty")]
    Empty,
    /// Over the per-field byte budget of the roster format.
    #[error("is {len} bytes long (limit {max})")]
    TooLong { len: usize, max: usize },
    /// Whitespace is the field separator; it cannot appear inside a field.
    #[error("must not contain whitespace")]
    HasWhitespace,
    /// The roster is a text file; tokens must be valid UTF-8.
    #[error("is not valid UTF-8")]
    NotUnicode,
}

/// Everything that can go wrong while registering a handle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WargateError {
    /// Wrong argument count on the command line.
    #[error("usage: register <handle>")]
    Usage,

    /// Ran on some machine other than the arena host.
    #[error("register only works on {expected}; this host is {actual}")]
    WrongHost {
        expected: &'static str,
        actual: String,
    },

    /// The local hostname could not be determined at all.
    #[error("unable to determine this machine's hostname: {source}")]
    HostnameLookup {
        #[source]
        source: io::Error,
    },

    /// The calling uid has no passwd entry (or the lookup itself failed).
    #[error("unable to resolve uid {uid} to a login name")]
    IdentityLookup {
        uid: u32,
        #[source]
        source: Option<io::Error>,
    },

    /// The connection-origin variable is not in the environment.
    #[error("no {var} in this session; connect to the arena host over SSH")]
    NoOrigin { var: &'static str },

    /// The connection-origin value has no address field to extract.
    #[error("connection origin {value:?} is missing its address field")]
    MalformedOrigin { value: String },

    /// A field failed roster-token validation.
    #[error("{field} {violation}")]
    InvalidToken {
        field: &'static str,
        violation: TokenViolation,
    },

    /// The roster file could not be opened read-write.
    #[error("unable to open roster {}: {}", .path.display(), .source)]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The exclusive roster lock could not be acquired.
    #[error("unable to lock the roster: {source}")]
    Lock {
        #[source]
        source: io::Error,
    },

    /// This account is on the roster already, from a different address.
    #[error("you are already registered from {origin}; ask an arena admin to move you")]
    AlreadyRegisteredElsewhere { origin: String },

    /// A different account is registered from the caller's address.
    #[error("someone else is already registered from {origin}; ask an arena admin if that is wrong")]
    OriginConflict { origin: String },

    /// The requested handle belongs to someone else.
    #[error("handle {handle:?} is already taken; pick another one")]
    HandleTaken { handle: String },

    /// I/O failure while scanning or appending under the lock.
    #[error("roster I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl WargateError {
    /// True for the wrong-argument-count case, which prints the bare usage
    /// line instead of a prefixed diagnostic.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage)
    }
}
