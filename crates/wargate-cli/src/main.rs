//! `register`: claim a handle on the wargame arena host.
//!
//! One argument, one job: validate the caller, lock the shared roster,
//! refuse on any conflict, otherwise append `<account> <origin> <handle>`
//! and print the origin address as confirmation.
//!
//! Exit status is 0 when a record was appended, and also when the caller
//! was already registered from this same address (nothing is re-appended
//! and the stored handle stands). Everything else exits 1 with a
//! diagnostic on stderr.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::debug;
use tracing_subscriber::EnvFilter;
use wargate_core::{ORIGIN_ENV, Registration, Session, SessionEnv, SystemIdentity, Token, register};
use wargate_error::{Result, TokenViolation, WargateError};

/// Where the shared roster lives on the arena host.
const ROSTER_PATH: &str = "/srv/wargate/roster.txt";

/// Optional override for the roster location (staging copies, drills).
const ROSTER_ENV: &str = "WARGATE_ROSTER";

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(Registration::Recorded { origin }) => {
            println!("{origin}");
            ExitCode::SUCCESS
        }
        Ok(Registration::AlreadyRegistered { origin, handle }) => {
            eprintln!(
                "register: you are already registered from {origin}; your handle {handle:?} stands"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<Registration> {
    let handle = parse_args(env::args_os().skip(1))?;

    let hostname = nix::unistd::gethostname()
        .map_err(|errno| WargateError::HostnameLookup {
            source: errno.into(),
        })?
        .to_string_lossy()
        .into_owned();
    let origin_value = env::var_os(ORIGIN_ENV).map(|value| value.to_string_lossy().into_owned());

    let session_env = SessionEnv {
        hostname: hostname.as_str(),
        uid: nix::unistd::getuid(),
        origin_value: origin_value.as_deref(),
    };
    let session = Session::resolve(&session_env, &SystemIdentity)?;

    let roster = roster_path(env::var_os(ROSTER_ENV));
    debug!(roster = %roster.display(), "registering against roster");
    register(&roster, &session, &handle)
}

/// Exactly one positional argument: the desired handle.
fn parse_args<I>(mut args: I) -> Result<Token>
where
    I: Iterator<Item = OsString>,
{
    let handle = args.next().ok_or(WargateError::Usage)?;
    if args.next().is_some() {
        return Err(WargateError::Usage);
    }
    let handle = handle.into_string().map_err(|_| WargateError::InvalidToken {
        field: "handle",
        violation: TokenViolation::NotUnicode,
    })?;
    Token::new("handle", handle)
}

fn roster_path(override_value: Option<OsString>) -> PathBuf {
    override_value.map_or_else(|| PathBuf::from(ROSTER_PATH), PathBuf::from)
}

/// One line per failure, plus the underlying cause when there is one. The
/// usage case prints the bare usage line, nothing else.
fn report(err: &WargateError) {
    if err.is_usage() {
        eprintln!("{err}");
        return;
    }
    eprintln!("register: {err}");
    let mut cause = std::error::Error::source(err);
    while let Some(inner) = cause {
        eprintln!("register:   caused by: {inner}");
        cause = inner.source();
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use std::os::unix::ffi::OsStringExt;

    use super::*;

    fn args(values: &[&str]) -> std::vec::IntoIter<OsString> {
        values
            .iter()
            .map(OsString::from)
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn no_arguments_is_a_usage_error() {
        assert!(matches!(
            parse_args(args(&[])).unwrap_err(),
            WargateError::Usage
        ));
    }

    #[test]
    fn extra_arguments_are_a_usage_error() {
        assert!(matches!(
            parse_args(args(&["blade", "stray"])).unwrap_err(),
            WargateError::Usage
        ));
    }

    #[test]
    fn one_argument_becomes_the_handle() {
        let handle = parse_args(args(&["blade"])).expect("valid handle");
        assert_eq!(handle.as_str(), "blade");
    }

    #[test]
    fn over_long_handles_are_refused_up_front() {
        let long = "x".repeat(40);
        let err = parse_args(args(&[long.as_str()])).unwrap_err();
        assert!(matches!(
            err,
            WargateError::InvalidToken {
                field: "handle",
                ..
            }
        ));
    }

    #[test]
    fn non_unicode_handles_are_refused() {
        let bad = OsString::from_vec(vec![0x66, 0xff, 0x67]);
        let err = parse_args(vec![bad].into_iter()).unwrap_err();
        assert!(matches!(
            err,
            WargateError::InvalidToken {
                violation: TokenViolation::NotUnicode,
                ..
            }
        ));
    }

    #[test]
    fn roster_path_defaults_to_the_arena_location() {
        assert_eq!(roster_path(None), PathBuf::from(ROSTER_PATH));
        assert_eq!(
            roster_path(Some(OsString::from("/tmp/drill-roster.txt"))),
            PathBuf::from("/tmp/drill-roster.txt")
        );
    }
}
