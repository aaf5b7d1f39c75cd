//! Core registration flow for the wargate arena gate.
//!
//! A user on the shared arena host claims a unique handle, bound to their
//! system account and the network address their session connected from.
//! The whole program is one linear operation:
//!
//! 1. [`session`]: validate the execution context and resolve who is
//!    calling, from where;
//! 2. [`roster`]: open the shared roster file and take its exclusive
//!    advisory lock;
//! 3. scan existing records for conflicts (one registration per account,
//!    per origin, per handle);
//! 4. append the new record if the scan came back clear.
//!
//! Any failure short-circuits; the roster guard releases the lock on the
//! way out regardless. [`registrar::register`] is the composition of the
//! four steps.

pub mod record;
pub mod registrar;
pub mod roster;
pub mod session;

pub use record::{MAX_TOKEN_LEN, Record, Token, parse_row};
pub use registrar::{Registration, register};
pub use roster::{Roster, ScanOutcome};
pub use session::{EXPECTED_HOST, IdentityLookup, ORIGIN_ENV, Session, SessionEnv, SystemIdentity};
pub use wargate_error::{Result, TokenViolation, WargateError};
