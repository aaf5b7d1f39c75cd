//! Roster records and the bounded tokens they are made of.
//!
//! A record is one line of the roster: three whitespace-separated fields,
//! `<account> <origin> <handle>`. New fields pass through [`Token`], which
//! enforces the format's per-field budget up front. Reading back is another
//! story: the roster predates this program and is compared as-is, so
//! [`parse_row`] accepts whatever three tokens a line happens to carry.

use std::fmt;

use wargate_error::{Result, TokenViolation, WargateError};

/// Per-field byte budget of the roster format.
pub const MAX_TOKEN_LEN: usize = 31;

/// A validated roster field: non-empty, at most [`MAX_TOKEN_LEN`] bytes,
/// free of whitespace.
///
/// Over-long input is rejected, never truncated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    value: String,
}

impl Token {
    /// Validate `value` as the named field ("handle", "account name", ...).
    ///
    /// The field name only feeds the diagnostic on rejection.
    pub fn new(field: &'static str, value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let violation = if value.is_empty() {
            Some(TokenViolation::Empty)
        } else if value.len() > MAX_TOKEN_LEN {
            Some(TokenViolation::TooLong {
                len: value.len(),
                max: MAX_TOKEN_LEN,
            })
        } else if value.chars().any(char::is_whitespace) {
            Some(TokenViolation::HasWhitespace)
        } else {
            None
        };
        match violation {
            Some(violation) => Err(WargateError::InvalidToken { field, violation }),
            None => Ok(Self { value }),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

/// The triple this program writes: one registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub account: Token,
    pub origin: Token,
    pub handle: Token,
}

impl Record {
    #[must_use]
    pub fn new(account: Token, origin: Token, handle: Token) -> Self {
        Self {
            account,
            origin,
            handle,
        }
    }
}

impl fmt::Display for Record {
    /// The wire form of the record, without the trailing newline.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.account, self.origin, self.handle)
    }
}

/// Split one roster line into `(account, origin, handle)`.
///
/// Lenient by design: pre-existing rows are compared however they look, and
/// anything past the third token is ignored. `None` means the line has
/// fewer than three tokens, which the scanner treats as the end of usable
/// data.
#[must_use]
pub fn parse_row(line: &str) -> Option<(&str, &str, &str)> {
    let mut fields = line.split_whitespace();
    let account = fields.next()?;
    let origin = fields.next()?;
    let handle = fields.next()?;
    Some((account, origin, handle))
}
